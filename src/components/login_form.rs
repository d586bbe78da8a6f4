use web_sys::HtmlInputElement;
use yew::prelude::*;

use crate::models::auth::{LoginRequest, RegisterRequest};

#[derive(Properties, PartialEq)]
pub struct LoginFormProps {
    pub submitting: bool,
    #[prop_or_default]
    pub error: Option<String>,
    pub on_login: Callback<LoginRequest>,
    pub on_register: Callback<RegisterRequest>,
}

/// Email/password form that signs in, or creates an account when toggled.
#[function_component(LoginForm)]
pub fn login_form(props: &LoginFormProps) -> Html {
    let email = use_state(String::new);
    let password = use_state(String::new);
    let name = use_state(String::new);
    let registering = use_state(|| false);

    let bind = |state: &UseStateHandle<String>| {
        let state = state.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            state.set(input.value());
        })
    };

    let onsubmit = {
        let email = email.clone();
        let password = password.clone();
        let name = name.clone();
        let registering = registering.clone();
        let on_login = props.on_login.clone();
        let on_register = props.on_register.clone();
        Callback::from(move |e: SubmitEvent| {
            e.prevent_default();
            let email = email.trim().to_string();
            let password = (*password).clone();
            if email.is_empty() || password.is_empty() {
                return;
            }

            if *registering {
                let name = name.trim();
                on_register.emit(RegisterRequest {
                    email,
                    password,
                    name: (!name.is_empty()).then(|| name.to_string()),
                });
            } else {
                on_login.emit(LoginRequest { email, password });
            }
        })
    };

    let toggle = {
        let registering = registering.clone();
        Callback::from(move |_| registering.set(!*registering))
    };

    let (title, action, switch_label) = if *registering {
        ("Create an account", "Register", "Already have an account? Sign in")
    } else {
        ("Sign in", "Sign in", "Need an account? Register")
    };

    html! {
        <form class="login-form" {onsubmit}>
            <h2>{title}</h2>

            if let Some(msg) = &props.error {
                <p class="status error">{"❌ "}{msg}</p>
            }

            if *registering {
                <label>
                    {"Name"}
                    <input type="text" value={(*name).clone()} oninput={bind(&name)} />
                </label>
            }
            <label>
                {"Email"}
                <input
                    type="email"
                    required=true
                    autocomplete="username"
                    value={(*email).clone()}
                    oninput={bind(&email)}
                />
            </label>
            <label>
                {"Password"}
                <input
                    type="password"
                    required=true
                    autocomplete="current-password"
                    value={(*password).clone()}
                    oninput={bind(&password)}
                />
            </label>

            <button type="submit" disabled={props.submitting}>
                {if props.submitting { "Please wait..." } else { action }}
            </button>
            <button type="button" class="link-button" onclick={toggle}>{switch_label}</button>
        </form>
    }
}
