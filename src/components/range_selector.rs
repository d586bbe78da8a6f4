use web_sys::HtmlSelectElement;
use yew::prelude::*;

use crate::services::api::TimeRange;

#[derive(Properties, PartialEq)]
pub struct RangeSelectorProps {
    pub range: TimeRange,
    pub on_change: Callback<TimeRange>,
}

/// Reporting window dropdown
#[function_component(RangeSelector)]
pub fn range_selector(props: &RangeSelectorProps) -> Html {
    let on_change = {
        let callback = props.on_change.clone();
        Callback::from(move |e: Event| {
            let target: HtmlSelectElement = e.target_unchecked_into();
            if let Ok(range) = target.value().parse::<TimeRange>() {
                callback.emit(range);
            }
        })
    };

    html! {
        <select
            class="range-selector"
            onchange={on_change}
            aria-label="Select reporting window"
            title="Select reporting window"
        >
            {
                TimeRange::all().iter().map(|r| {
                    let selected = *r == props.range;
                    html! {
                        <option value={r.code()} {selected}>{r.description()}</option>
                    }
                }).collect::<Html>()
            }
        </select>
    }
}
