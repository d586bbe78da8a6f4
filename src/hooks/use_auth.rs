use wasm_bindgen_futures::spawn_local;
use yew::prelude::*;

use crate::models::auth::{LoginRequest, RegisterRequest};
use crate::services::app::AppServices;
use crate::services::errors::display_message;

/// Handle returned by `use_auth` hook
#[derive(Clone, PartialEq)]
pub struct AuthHandle {
    pub is_authenticated: bool,
    pub submitting: bool,
    pub error: Option<String>,
    pub login: Callback<LoginRequest>,
    pub register: Callback<RegisterRequest>,
    pub logout: Callback<()>,
}

/// Custom hook for the login, registration and logout flows
#[hook]
pub fn use_auth(services: AppServices) -> AuthHandle {
    let authenticated = use_state(|| services.is_authenticated());
    let submitting = use_state(|| false);
    let error = use_state(|| None::<String>);

    {
        let authenticated = authenticated.clone();
        use_effect_with(services.clone(), move |services| {
            // A 401 anywhere clears the credential behind our back.
            authenticated.set(services.is_authenticated());
            let subscription = services.on_auth_change(move |now| authenticated.set(now));
            move || drop(subscription)
        });
    }

    let login = {
        let services = services.clone();
        let authenticated = authenticated.clone();
        let submitting = submitting.clone();
        let error = error.clone();
        Callback::from(move |request: LoginRequest| {
            let services = services.clone();
            let authenticated = authenticated.clone();
            let submitting = submitting.clone();
            let error = error.clone();

            submitting.set(true);
            error.set(None);
            spawn_local(async move {
                match services.login(request).await {
                    Ok(user) => {
                        tracing::info!("signed in as {}", user.display_name());
                        authenticated.set(true);
                    }
                    Err(e) => error.set(Some(display_message(&e))),
                }
                submitting.set(false);
            });
        })
    };

    let register = {
        let services = services.clone();
        let authenticated = authenticated.clone();
        let submitting = submitting.clone();
        let error = error.clone();
        Callback::from(move |request: RegisterRequest| {
            let services = services.clone();
            let authenticated = authenticated.clone();
            let submitting = submitting.clone();
            let error = error.clone();

            submitting.set(true);
            error.set(None);
            spawn_local(async move {
                match services.register(request).await {
                    Ok(_) => authenticated.set(true),
                    Err(e) => error.set(Some(display_message(&e))),
                }
                submitting.set(false);
            });
        })
    };

    let logout = {
        let authenticated = authenticated.clone();
        Callback::from(move |()| {
            services.logout();
            authenticated.set(false);
        })
    };

    AuthHandle {
        is_authenticated: *authenticated,
        submitting: *submitting,
        error: (*error).clone(),
        login,
        register,
        logout,
    }
}
