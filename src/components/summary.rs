use crate::models::metrics::SavingsSummary;
use crate::utils::metrics::{format_count, format_currency, format_percent, round_to};
use std::rc::Rc;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct SummaryProps {
    pub summary: Rc<SavingsSummary>,
}

#[function_component(Summary)]
pub fn summary(props: &SummaryProps) -> Html {
    let summary = &props.summary;
    let percentage = round_to(summary.savings_percentage(), 1);

    html! {
         <div class="data-summary">
            <div class="summary-grid">
                <div class="summary-item">
                    <h3>{"Could Have Spent"}</h3>
                    <p class="summary-value">{format_currency(summary.could_have_spent)}</p>
                </div>
                <div class="summary-item">
                    <h3>{"Actually Spent"}</h3>
                    <p class="summary-value">{format_currency(summary.actually_spent)}</p>
                </div>
                <div class="summary-item summary-item-highlight">
                    <h3>{"Saved"}</h3>
                    <p class="summary-value">{format_currency(summary.savings_amount())}</p>
                    <p class="summary-detail">{format_percent(percentage, 1)}</p>
                </div>
                <div class="summary-item">
                    <h3>{"Requests"}</h3>
                    <p class="summary-value">{format_count(summary.total_requests)}</p>
                    <p class="summary-detail">
                        {format!("{} served from cache", format_count(summary.cached_requests))}
                    </p>
                </div>
            </div>
        </div>
    }
}
