//! Terminal rendering of a built view model. Every value arrives already
//! formatted; this module only lays it out.

use atmos_core::ViewModel;

const METER_WIDTH: usize = 20;

pub fn view(vm: &ViewModel) {
    println!("{}", vm.place_label);
    println!("{}", vm.meta_line);
    println!();

    let c = &vm.current;
    println!("  {}  {}  [{}]", c.temperature, c.summary, c.icon);
    println!("  {}", c.feels_like);
    println!(
        "  Wind {}   Humidity {}   Precip {}",
        c.wind, c.humidity, c.precipitation
    );
    println!(
        "  UV {}   Visibility {}   Pressure {}",
        c.uv_index, c.visibility, c.pressure
    );
    println!();

    println!(
        "  Today  {}  {}  {}",
        vm.today.min,
        meter(vm.today.position_pct),
        vm.today.max
    );
    println!("  {}", vm.sun_line);
    println!();

    let s = &vm.signals;
    println!("  Comfort: {}", s.comfort);
    println!("  Heat index {:>7}  {}", s.heat_index, meter(s.gauges.heat_index_pct));
    println!("  Dew point  {:>7}  {}", s.dew_point, meter(s.gauges.dew_point_pct));
    println!("  Cloud      {:>7}  {}", s.cloud_cover, meter(s.gauges.cloud_cover_pct));
    println!(
        "  Rain next hour {:>3}  {}",
        s.next_hour_precipitation,
        meter(s.gauges.precipitation_pct)
    );
    println!();

    println!("Next hours");
    for tile in vm.hourly.iter().take(12) {
        println!(
            "  {}  {:>5}  {:<12}  {:<9}  {:<9}  {}",
            tile.time, tile.temperature, tile.icon, tile.precipitation, tile.wind, tile.feels_like
        );
    }
    println!();

    println!("Next days");
    for row in &vm.daily {
        println!(
            "  {:<6} {:<22} {:>5} / {:<5}  {:<14} {}",
            row.label, row.summary, row.high, row.low, row.precipitation, row.wind
        );
    }
    println!();

    if !vm.insights.is_empty() {
        println!("Insights");
        for tip in &vm.insights {
            println!("  {}: {}", tip.title, tip.text);
        }
    }
}

fn meter(pct: f64) -> String {
    let filled = ((pct / 100.0) * METER_WIDTH as f64).round() as usize;
    let filled = filled.min(METER_WIDTH);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(METER_WIDTH - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meter_spans_empty_to_full() {
        assert_eq!(meter(0.0), format!("[{}]", "-".repeat(20)));
        assert_eq!(meter(100.0), format!("[{}]", "#".repeat(20)));
        assert_eq!(meter(50.0), format!("[{}{}]", "#".repeat(10), "-".repeat(10)));
    }
}
