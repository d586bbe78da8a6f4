use crate::models::metrics::ValidationSummary;
use crate::utils::metrics::{format_count, format_percent};
use std::rc::Rc;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct ValidationPanelProps {
    pub summary: Rc<ValidationSummary>,
}

#[function_component(ValidationPanel)]
pub fn validation_panel(props: &ValidationPanelProps) -> Html {
    let summary = &props.summary;

    html! {
        <div class="validation-panel">
            <div class="summary-grid">
                <div class="summary-item">
                    <h3>{"Pass Rate"}</h3>
                    <p class="summary-value">{format_percent(summary.pass_rate(), 1)}</p>
                </div>
                <div class="summary-item">
                    <h3>{"Validated"}</h3>
                    <p class="summary-value">{format_count(summary.total)}</p>
                </div>
                <div class="summary-item">
                    <h3>{"Failed"}</h3>
                    <p class="summary-value">{format_count(summary.failed)}</p>
                </div>
            </div>

            if !summary.recent_failures.is_empty() {
                <h3>{"Recent Failures"}</h3>
                <ul class="validation-failures">
                    {
                        summary.recent_failures.iter().map(|failure| html! {
                            <li key={failure.request_id.clone()}>
                                <code>{&failure.rule}</code>
                                {" "}{&failure.message}
                                <span class="validation-meta">
                                    {format!(" ({}, {})", failure.request_id, failure.occurred_at.format("%H:%M:%S"))}
                                </span>
                            </li>
                        }).collect::<Html>()
                    }
                </ul>
            }
        </div>
    }
}
