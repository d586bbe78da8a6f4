use yew::prelude::*;

use gateway_dashboard::components::{
    CacheStatsCard, DriftPanel, LoginForm, RangeSelector, RoutingTable, ValidationPanel,
    chart::Chart, status::Status, summary::Summary,
};
use gateway_dashboard::config::Config;
use gateway_dashboard::hooks::use_auth::use_auth;
use gateway_dashboard::hooks::use_metrics::{
    use_cache_stats, use_current_user, use_drift_report, use_routing_stats, use_savings,
    use_usage, use_validation_summary,
};
use gateway_dashboard::services::api::TimeRange;
use gateway_dashboard::services::app::AppServices;
use gateway_dashboard::utils::logging;

#[derive(Properties, PartialEq)]
struct AppProps {
    services: AppServices,
}

#[function_component(App)]
fn app(props: &AppProps) -> Html {
    let auth = use_auth(props.services.clone());

    html! {
        <div class="app-container">
            <header class="app-header">
                <h1>{"Gateway Dashboard"}</h1>
                if props.services.config.use_mock {
                    <span class="mock-badge">{"Demo data"}</span>
                }
            </header>

            <main class="app-main">
                if auth.is_authenticated {
                    <Dashboard services={props.services.clone()} on_logout={auth.logout.clone()} />
                } else {
                    <LoginForm
                        submitting={auth.submitting}
                        error={auth.error.clone()}
                        on_login={auth.login.clone()}
                        on_register={auth.register.clone()}
                    />
                }
            </main>

            <style>
                {include_str!("style.css")}
            </style>
        </div>
    }
}

#[derive(Properties, PartialEq)]
struct DashboardProps {
    services: AppServices,
    on_logout: Callback<()>,
}

#[function_component(Dashboard)]
fn dashboard(props: &DashboardProps) -> Html {
    let range = use_state(TimeRange::default);
    let services = &props.services;

    let user = use_current_user(services.clone());
    let savings = use_savings(services.clone(), *range);
    let usage = use_usage(services.clone(), *range);
    let cache = use_cache_stats(services.clone());
    let routing = use_routing_stats(services.clone());
    let drift = use_drift_report(services.clone());
    let validation = use_validation_summary(services.clone());

    let on_range_change = {
        let range = range.clone();
        Callback::from(move |r: TimeRange| range.set(r))
    };

    let on_logout = {
        let on_logout = props.on_logout.clone();
        Callback::from(move |_| on_logout.emit(()))
    };

    html! {
        <>
            <section class="toolbar">
                if let Some(user) = &user.data {
                    <span class="user-name">{user.display_name()}</span>
                }
                <RangeSelector range={*range} on_change={on_range_change} />
                <button class="logout-button" onclick={on_logout}>{"Log out"}</button>
            </section>

            <section class="data-section">
                <h2>{"Savings"}</h2>
                <Status is_loading={savings.is_loading} error={savings.error.clone()} on_retry={savings.refetch.clone()} />
                if let Some(summary) = &savings.data {
                    <Summary summary={summary.clone()} />
                }
            </section>

            <section class="chart-section">
                <h2>{"Usage"}</h2>
                <Status is_loading={usage.is_loading} error={usage.error.clone()} on_retry={usage.refetch.clone()} />
                if let Some(data) = &usage.data {
                    <Chart usage={data.clone()} />
                }
            </section>

            <section class="data-section">
                <h2>{"Cache"}</h2>
                <Status is_loading={cache.is_loading} error={cache.error.clone()} on_retry={cache.refetch.clone()} />
                if let Some(stats) = &cache.data {
                    <CacheStatsCard stats={stats.clone()} />
                }
            </section>

            <section class="data-section">
                <h2>{"Routing"}</h2>
                <Status is_loading={routing.is_loading} error={routing.error.clone()} on_retry={routing.refetch.clone()} />
                if let Some(stats) = &routing.data {
                    <RoutingTable stats={stats.clone()} />
                }
            </section>

            <section class="data-section">
                <h2>{"Drift"}</h2>
                <Status is_loading={drift.is_loading} error={drift.error.clone()} on_retry={drift.refetch.clone()} />
                if let Some(report) = &drift.data {
                    <DriftPanel report={report.clone()} />
                }
            </section>

            <section class="data-section">
                <h2>{"Validation"}</h2>
                <Status is_loading={validation.is_loading} error={validation.error.clone()} on_retry={validation.refetch.clone()} />
                if let Some(summary) = &validation.data {
                    <ValidationPanel summary={summary.clone()} />
                }
            </section>
        </>
    }
}

#[derive(Properties, PartialEq)]
struct StartupErrorProps {
    message: String,
}

#[function_component(StartupError)]
fn startup_error(props: &StartupErrorProps) -> Html {
    html! {
        <div class="app-container">
            <div class="status error">
                <p>{"❌ Failed to start: "}{&props.message}</p>
            </div>
        </div>
    }
}

fn main() {
    logging::init(Config::LOG_LEVEL);

    match AppServices::from_env() {
        Ok(services) => {
            yew::Renderer::<App>::with_props(AppProps { services }).render();
        }
        Err(e) => {
            tracing::error!("failed to start: {e}");
            yew::Renderer::<StartupError>::with_props(StartupErrorProps {
                message: e.to_string(),
            })
            .render();
        }
    }
}
