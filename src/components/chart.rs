use charming::{
    Chart as CharmingChart,
    component::{Axis, Grid, Legend, Title},
    element::{
        AxisLabel, AxisPointer, AxisPointerType, AxisType, LineStyle, LineStyleType, SplitLine,
        TextStyle, Tooltip, Trigger,
    },
    renderer::WasmRenderer,
    series::Line,
};
use std::rc::Rc;
use web_sys::HtmlElement;
use yew::prelude::*;

use crate::models::metrics::UsageTimeseries;
use crate::utils::debounce::create_debounced_resize_listener;
use crate::utils::metrics::ChartRow;

const CHART_ID: &str = "usage-chart";

const SERIES_COLORS: [&str; 6] = [
    "#00b4a0", "#648fff", "#785ef0", "#dc267f", "#fe6100", "#ffb000",
];

#[derive(Properties, PartialEq)]
pub struct ChartProps {
    pub usage: Rc<UsageTimeseries>,
}

/// Row-oriented data handed to the renderer.
#[derive(Debug, Clone, PartialEq)]
struct ChartData {
    rows: Vec<ChartRow>,
    series: Vec<String>,
}

#[function_component(Chart)]
pub fn chart(props: &ChartProps) -> Html {
    let container_ref = use_node_ref();
    let data = use_memo(props.usage.clone(), |usage| ChartData {
        rows: usage.rows(),
        series: usage.series_names().into_iter().map(String::from).collect(),
    });

    {
        let container_ref = container_ref.clone();

        use_effect_with((data, container_ref), |(data, container_ref)| {
            let listener = container_ref.cast::<HtmlElement>().and_then(|container| {
                render_chart(&container, data);

                let data = data.clone();
                create_debounced_resize_listener(move || render_chart(&container, &data), 150)
            });

            move || drop(listener)
        });
    }

    if props.usage.is_empty() {
        return html! {
            <div class="chart-container empty">
                <p>{"No usage recorded for this range yet."}</p>
            </div>
        };
    }

    html! {
        <div class="chart-container" ref={container_ref}>
            <div id={CHART_ID} />
        </div>
    }
}

fn render_chart(container: &HtmlElement, data: &ChartData) {
    let width = container.client_width().cast_unsigned();
    let height = container.client_height().cast_unsigned();

    if width == 0 || height == 0 || data.rows.is_empty() {
        return;
    }

    let chart = build_chart(data);
    if let Err(e) = WasmRenderer::new(width, height).render(CHART_ID, &chart) {
        web_sys::console::error_1(&format!("Render error: {e:?}").into());
    }
}

fn build_chart(data: &ChartData) -> CharmingChart {
    let x_data: Vec<String> = data.rows.iter().map(|row| row.date.clone()).collect();

    let mut chart = CharmingChart::new()
        .title(
            Title::new()
                .text("Spend")
                .left("center")
                .text_style(TextStyle::new().font_size(16).color("#1f2937")),
        )
        .tooltip(
            Tooltip::new()
                .trigger(Trigger::Axis)
                .axis_pointer(AxisPointer::new().type_(AxisPointerType::Line)),
        )
        .legend(Legend::new().bottom("0"))
        .grid(
            Grid::new()
                .left("8%")
                .right("4%")
                .bottom("18%")
                .contain_label(true),
        )
        .x_axis(
            Axis::new()
                .type_(AxisType::Category)
                .data(x_data)
                .axis_label(AxisLabel::new().color("#6b7280")),
        )
        .y_axis(
            Axis::new()
                .type_(AxisType::Value)
                .name("USD")
                .axis_label(AxisLabel::new().color("#6b7280"))
                .split_line(
                    SplitLine::new().line_style(
                        LineStyle::new()
                            .color("#e5e7eb")
                            .type_(LineStyleType::Dashed),
                    ),
                ),
        );

    for (i, name) in data.series.iter().enumerate() {
        // Rows lacking this series plot as zero.
        let values: Vec<f64> = data
            .rows
            .iter()
            .map(|row| row.get(name).unwrap_or(0.0))
            .collect();

        chart = chart.series(
            Line::new()
                .name(name.as_str())
                .data(values)
                .line_style(LineStyle::new().color(SERIES_COLORS[i % SERIES_COLORS.len()])),
        );
    }

    chart
}
