use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct StatusProps {
    pub is_loading: bool,
    #[prop_or_default]
    pub error: Option<String>,
    pub on_retry: Callback<()>,
}

/// Loading spinner or error message with a retry button; renders nothing once data is in.
#[function_component(Status)]
pub fn status(props: &StatusProps) -> Html {
    match &props.error {
        Some(msg) => {
            let onclick = {
                let on_retry = props.on_retry.clone();
                Callback::from(move |_| on_retry.emit(()))
            };
            html! {
                <div class="status error">
                    <p>{"❌ Error: "}{msg}</p>
                    <button class="retry-button" {onclick} disabled={props.is_loading}>
                        {if props.is_loading { "Retrying..." } else { "Retry" }}
                    </button>
                </div>
            }
        }
        None if props.is_loading => html! {
            <div class="status loading">
                <div class="spinner"></div>
                <p>{"Loading data..."}</p>
            </div>
        },
        None => html! {},
    }
}
