use std::collections::BTreeMap;
use std::fmt::Write;

use pm25_core::RunResult;
use serde::Serialize;

/// JSON form: station label to average, plus the regional average.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport {
    stations: BTreeMap<String, f64>,
    regional_average: f64,
}

/// Human readable summary, one station per line followed by the regional average.
pub fn render_text(result: &RunResult) -> String {
    let mut out = String::from("PM2.5 for each station:\n");
    for station in result.stations() {
        let _ = writeln!(
            out,
            "  {}: {:.2} ({} samples)",
            station.label, station.average, station.samples
        );
    }
    let _ = writeln!(
        out,
        "Average PM2.5 for all stations in region: {:.2}",
        result.regional_average()
    );
    out
}

pub fn render_json(result: &RunResult) -> serde_json::Result<String> {
    serde_json::to_string_pretty(&JsonReport {
        stations: result.to_map(),
        regional_average: result.regional_average(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_result() -> RunResult {
        serde_json::from_value(json!({
            "stations": [
                {"label": "A", "average": 11.0, "samples": 2},
                {"label": "B", "average": 22.0, "samples": 2}
            ],
            "regionalAverage": 16.5
        }))
        .unwrap()
    }

    #[test]
    fn test_render_text() {
        let text = render_text(&sample_result());
        assert_eq!(
            text,
            "PM2.5 for each station:\n  A: 11.00 (2 samples)\n  B: 22.00 (2 samples)\n\
             Average PM2.5 for all stations in region: 16.50\n"
        );
    }

    #[test]
    fn test_render_json() {
        let rendered = render_json(&sample_result()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(
            value,
            json!({
                "stations": {"A": 11.0, "B": 22.0},
                "regionalAverage": 16.5
            })
        );
    }
}
