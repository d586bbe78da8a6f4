use crate::models::metrics::RoutingStats;
use crate::utils::metrics::{format_count, format_currency, format_percent};
use std::rc::Rc;
use yew::prelude::*;

#[derive(Properties, PartialEq)]
pub struct RoutingTableProps {
    pub stats: Rc<RoutingStats>,
}

/// Provider/model routes, most expensive first
#[function_component(RoutingTable)]
pub fn routing_table(props: &RoutingTableProps) -> Html {
    let stats = &props.stats;

    if stats.routes.is_empty() {
        return html! {
            <p class="empty-state">{"No routed traffic yet."}</p>
        };
    }

    html! {
        <table class="routing-table">
            <thead>
                <tr>
                    <th>{"Provider"}</th>
                    <th>{"Model"}</th>
                    <th class="numeric">{"Requests"}</th>
                    <th class="numeric">{"Cost"}</th>
                    <th class="numeric">{"Share"}</th>
                    <th class="numeric">{"Avg Latency"}</th>
                </tr>
            </thead>
            <tbody>
                {
                    stats.by_cost().into_iter().map(|route| html! {
                        <tr key={format!("{}/{}", route.provider, route.model)}>
                            <td>{&route.provider}</td>
                            <td>{&route.model}</td>
                            <td class="numeric">{format_count(route.requests)}</td>
                            <td class="numeric">{format_currency(route.cost)}</td>
                            <td class="numeric">{format_percent(stats.cost_share(route), 1)}</td>
                            <td class="numeric">
                                {route.avg_latency_ms.map_or_else(|| "n/a".to_string(), |ms| format!("{ms:.0} ms"))}
                            </td>
                        </tr>
                    }).collect::<Html>()
                }
            </tbody>
            <tfoot>
                <tr>
                    <td colspan="2">{"Total"}</td>
                    <td class="numeric">{format_count(stats.total_requests())}</td>
                    <td class="numeric">{format_currency(stats.total_cost())}</td>
                    <td colspan="2"></td>
                </tr>
            </tfoot>
        </table>
    }
}
