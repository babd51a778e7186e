use std::collections::HashMap;

use anyhow::{Context, Result, anyhow};
use serde_json::Value;

use crate::relation::RelationId;

#[derive(Clone, Debug, Default)]
pub struct MetricsMatrix {
    pub series: Vec<MetricsSeries>,
}

#[derive(Clone, Debug)]
pub struct MetricsSeries {
    pub labels: HashMap<String, String>,
    pub samples: Vec<(f64, f64)>,
}

impl MetricsSeries {
    pub fn relation_id(&self) -> Option<RelationId> {
        let Some(label) = self.labels.get("table_id") else {
            return None;
        };
        label.trim().parse().ok()
    }

    pub fn latest_value(&self) -> Option<f64> {
        self.samples.last().map(|&(_, value)| value)
    }
}

pub(super) fn parse_throughput_matrix(raw: &str) -> Result<MetricsMatrix> {
    let parsed: Value = serde_json::from_str(raw).context("invalid metrics JSON")?;

    let result = if let Some(array) = parsed.as_array() {
        array
    } else if let Some(array) = parsed.get("result").and_then(Value::as_array) {
        array
    } else if let Some(array) = parsed
        .get("data")
        .and_then(|data| data.get("result"))
        .and_then(Value::as_array)
    {
        array
    } else {
        return Err(anyhow!("metrics payload has no result series"));
    };

    let mut series = Vec::with_capacity(result.len());
    for entry in result {
        let labels = entry
            .get("metric")
            .and_then(Value::as_object)
            .map(|object| {
                object
                    .iter()
                    .filter_map(|(key, value)| {
                        value.as_str().map(|value| (key.clone(), value.to_string()))
                    })
                    .collect::<HashMap<_, _>>()
            })
            .unwrap_or_default();

        let mut samples = Vec::new();
        if let Some(values) = entry.get("values").and_then(Value::as_array) {
            samples.extend(values.iter().filter_map(parse_sample));
        } else if let Some(sample) = entry.get("value").and_then(parse_sample) {
            samples.push(sample);
        }

        series.push(MetricsSeries { labels, samples });
    }

    Ok(MetricsMatrix { series })
}

pub(super) fn latest_by_relation(matrix: &MetricsMatrix) -> HashMap<RelationId, f64> {
    let mut latest = HashMap::with_capacity(matrix.series.len());
    for series in &matrix.series {
        if let Some(relation) = series.relation_id()
            && let Some(value) = series.latest_value()
        {
            latest.insert(relation, value);
        }
    }
    latest
}

fn parse_sample(value: &Value) -> Option<(f64, f64)> {
    let pair = value.as_array()?;
    if pair.len() != 2 {
        return None;
    }
    Some((number_from(&pair[0])?, number_from(&pair[1])?))
}

fn number_from(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reduces_each_series_to_its_last_sample() {
        let raw = r#"{
            "result": [
                {
                    "metric": {"table_id": "42", "job": "wavekit", "instance": "c0"},
                    "values": [[1700000000, "10"], [1700000005, "15"]]
                }
            ]
        }"#;

        let matrix = parse_throughput_matrix(raw).unwrap();
        let latest = latest_by_relation(&matrix);
        assert_eq!(latest.len(), 1);
        assert_eq!(latest.get(&42), Some(&15.0));
    }

    #[test]
    fn accepts_numeric_sample_values_and_prometheus_wrapping() {
        let raw = r#"{
            "data": {
                "result": [
                    {"metric": {"table_id": "7"}, "values": [[1700000000, 12.5]]}
                ]
            }
        }"#;

        let latest = latest_by_relation(&parse_throughput_matrix(raw).unwrap());
        assert_eq!(latest.get(&7), Some(&12.5));
    }

    #[test]
    fn series_without_a_usable_table_id_are_skipped() {
        let raw = r#"[
            {"metric": {"job": "wavekit"}, "values": [[0, "1"]]},
            {"metric": {"table_id": "not-a-number"}, "values": [[0, "2"]]},
            {"metric": {"table_id": "3"}, "values": [[0, "3"]]}
        ]"#;

        let latest = latest_by_relation(&parse_throughput_matrix(raw).unwrap());
        assert_eq!(latest.len(), 1);
        assert_eq!(latest.get(&3), Some(&3.0));
    }

    #[test]
    fn zero_is_a_real_sample() {
        let raw = r#"[{"metric": {"table_id": "9"}, "values": [[0, "0"]]}]"#;
        let latest = latest_by_relation(&parse_throughput_matrix(raw).unwrap());
        assert_eq!(latest.get(&9), Some(&0.0));
    }

    #[test]
    fn single_value_series_fall_back_to_the_value_field() {
        let raw = r#"[{"metric": {"table_id": "5"}, "value": [1700000000, "8"]}]"#;
        let latest = latest_by_relation(&parse_throughput_matrix(raw).unwrap());
        assert_eq!(latest.get(&5), Some(&8.0));
    }

    #[test]
    fn shapeless_payloads_fail() {
        assert!(parse_throughput_matrix(r#"{"status": "ok"}"#).is_err());
        assert!(parse_throughput_matrix("not json").is_err());
    }

    #[test]
    fn empty_series_has_no_latest_value() {
        let raw = r#"[{"metric": {"table_id": "1"}, "values": []}]"#;
        let latest = latest_by_relation(&parse_throughput_matrix(raw).unwrap());
        assert!(latest.is_empty());
    }
}
