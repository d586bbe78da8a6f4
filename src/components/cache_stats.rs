use crate::models::metrics::CacheStats;
use crate::utils::metrics::{format_count, format_currency, format_percent};
use std::rc::Rc;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct CacheStatsCardProps {
    pub stats: Rc<CacheStats>,
}

#[function_component(CacheStatsCard)]
pub fn cache_stats_card(props: &CacheStatsCardProps) -> Html {
    let stats = &props.stats;

    html! {
        <div class="cache-stats">
            <div class="summary-grid">
                <div class="summary-item">
                    <h3>{"Hit Rate"}</h3>
                    <p class="summary-value">{format_percent(stats.hit_rate(), 1)}</p>
                    <p class="summary-detail">
                        {format!("{} of {} lookups", format_count(stats.hits), format_count(stats.total_lookups()))}
                    </p>
                </div>
                <div class="summary-item">
                    <h3>{"Cached Entries"}</h3>
                    <p class="summary-value">{format_count(stats.entries)}</p>
                </div>
                <div class="summary-item">
                    <h3>{"Tokens Saved"}</h3>
                    <p class="summary-value">{format_count(stats.tokens_saved)}</p>
                </div>
                <div class="summary-item">
                    <h3>{"Cost Avoided"}</h3>
                    <p class="summary-value">{format_currency(stats.cost_saved)}</p>
                </div>
            </div>
        </div>
    }
}
