use crate::models::metrics::{DriftReport, DriftSeverity};
use std::rc::Rc;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct DriftPanelProps {
    pub report: Rc<DriftReport>,
}

#[function_component(DriftPanel)]
pub fn drift_panel(props: &DriftPanelProps) -> Html {
    let report = &props.report;

    if report.alerts.is_empty() {
        return html! {
            <p class="empty-state">{"✅ No drift detected."}</p>
        };
    }

    let urgent = report.count_at_least(DriftSeverity::High);

    html! {
        <div class="drift-panel">
            <p class="drift-headline">
                {format!("{} alerts, {} high or critical", report.alerts.len(), urgent)}
            </p>
            <ul class="drift-list">
                {
                    report.sorted().into_iter().map(|alert| {
                        let change = alert.change_percentage();
                        let icon = if change > 0.0 { "↑" } else if change < 0.0 { "↓" } else { "→" };
                        html! {
                            <li key={alert.id.clone()} class="drift-item">
                                <span class={classes!("drift-badge", alert.severity.css_class())}>
                                    {alert.severity.label()}
                                </span>
                                <span class="drift-metric">{&alert.metric}</span>
                                <span class="drift-values">
                                    {format!("{} → {}", alert.baseline, alert.current)}
                                </span>
                                <span class="drift-change">{format!("{icon} {:+.1}%", change)}</span>
                                <span class="drift-time">
                                    {alert.detected_at.format("%Y-%m-%d %H:%M").to_string()}
                                </span>
                            </li>
                        }
                    }).collect::<Html>()
                }
            </ul>
        </div>
    }
}
