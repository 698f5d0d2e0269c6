use crate::analyzers::category::{SeverityCategory, classify};
use crate::analyzers::types::{
    AnalysisReport, CategoryAverageEntry, CategoryAverages, CategoryCount, CorrelationPoint,
    PresentAverages, RankedStation,
};
use crate::analyzers::utility::{mean, present_mean, zero_filled_mean};
use crate::model::{PollutantKind, StationReading};
use chrono::Utc;
use std::collections::BTreeMap;

/// Groups readings by severity band. Bands with no members are absent.
fn group_by_category(readings: &[StationReading]) -> BTreeMap<SeverityCategory, Vec<&StationReading>> {
    let mut groups: BTreeMap<SeverityCategory, Vec<&StationReading>> = BTreeMap::new();
    for reading in readings {
        groups.entry(reading.category()).or_default().push(reading);
    }
    groups
}

/// Counts readings per severity band. The counts sum to `readings.len()`.
pub fn distribution_by_category(readings: &[StationReading]) -> BTreeMap<SeverityCategory, usize> {
    let mut counts = BTreeMap::new();
    for reading in readings {
        *counts.entry(reading.category()).or_insert(0) += 1;
    }
    counts
}

/// Per-band means of the AQI and of every pollutant kind.
///
/// A station that does not report a pollutant still counts toward that
/// pollutant's denominator, so missing values pull the band's mean toward
/// zero. Chart scales depend on this; use [`pollutant_present_averages`] for
/// means over reported values only.
pub fn pollutant_averages(readings: &[StationReading]) -> BTreeMap<SeverityCategory, CategoryAverages> {
    group_by_category(readings)
        .into_iter()
        .map(|(category, members)| {
            let count = members.len();
            let indices: Vec<f64> = members.iter().map(|r| f64::from(r.primary_index)).collect();

            let pollutants = PollutantKind::ALL
                .into_iter()
                .map(|kind| {
                    let avg = zero_filled_mean(members.iter().map(|r| r.pollutants.get(kind)), count);
                    (kind, avg)
                })
                .collect();

            (
                category,
                CategoryAverages {
                    members: count,
                    avg_primary_index: mean(&indices),
                    pollutants,
                },
            )
        })
        .collect()
}

/// Per-band means where each pollutant is averaged over the stations that
/// report it.
pub fn pollutant_present_averages(readings: &[StationReading]) -> BTreeMap<SeverityCategory, PresentAverages> {
    group_by_category(readings)
        .into_iter()
        .map(|(category, members)| {
            let indices: Vec<f64> = members.iter().map(|r| f64::from(r.primary_index)).collect();

            let pollutants = PollutantKind::ALL
                .into_iter()
                .map(|kind| (kind, present_mean(members.iter().map(|r| r.pollutants.get(kind)))))
                .collect();

            (
                category,
                PresentAverages {
                    members: members.len(),
                    avg_primary_index: mean(&indices),
                    pollutants,
                },
            )
        })
        .collect()
}

/// The `n` highest-AQI readings, highest first. Equal values keep their
/// input order.
pub fn top_by_index(readings: &[StationReading], n: usize) -> Vec<StationReading> {
    let mut sorted = readings.to_vec();
    // sort_by is stable
    sorted.sort_by(|a, b| b.primary_index.cmp(&a.primary_index));
    sorted.truncate(n);
    sorted
}

/// PM2.5/PM10 pairs for stations reporting both with non-zero values and a
/// non-zero AQI.
pub fn pollutant_correlation(readings: &[StationReading]) -> Vec<CorrelationPoint> {
    readings
        .iter()
        .filter(|r| r.primary_index != 0)
        .filter_map(|r| {
            let pm25 = r.pollutants.pm25.filter(|v| *v != 0.0)?;
            let pm10 = r.pollutants.pm10.filter(|v| *v != 0.0)?;
            Some(CorrelationPoint {
                station: r.name.clone(),
                pm25,
                pm10,
                aqi: r.primary_index,
            })
        })
        .collect()
}

/// Readings that carry both coordinates and can be placed on a map.
pub fn mappable(readings: &[StationReading]) -> impl Iterator<Item = &StationReading> {
    readings.iter().filter(|r| r.coordinates().is_some())
}

/// Builds the full chart report for a set of readings.
pub fn build_report(readings: &[StationReading], top_n: usize) -> AnalysisReport {
    let distribution = distribution_by_category(readings)
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category,
            count,
            color: category.color(),
        })
        .collect();

    let mut present = pollutant_present_averages(readings);
    let averages = pollutant_averages(readings)
        .into_iter()
        .filter_map(|(category, zero_filled)| {
            let present_only = present.remove(&category)?;
            Some(CategoryAverageEntry {
                category,
                color: classify(i64::from(category.representative_index())).color(),
                zero_filled,
                present_only,
            })
        })
        .collect();

    let top_stations = top_by_index(readings, top_n)
        .iter()
        .map(RankedStation::from)
        .collect();

    AnalysisReport {
        generated_at: Utc::now(),
        station_count: readings.len(),
        mappable_count: mappable(readings).count(),
        distribution,
        averages,
        top_stations,
        correlation: pollutant_correlation(readings),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PollutantLevels;

    fn reading(name: &str, aqi: u32) -> StationReading {
        StationReading {
            uid: 0,
            name: name.to_string(),
            latitude: Some(28.6),
            longitude: Some(77.2),
            primary_index: aqi,
            pollutants: PollutantLevels::default(),
            observed_at: None,
        }
    }

    fn with_pm(name: &str, aqi: u32, pm25: Option<f64>, pm10: Option<f64>) -> StationReading {
        let mut r = reading(name, aqi);
        r.pollutants.pm25 = pm25;
        r.pollutants.pm10 = pm10;
        r
    }

    #[test]
    fn test_distribution_empty() {
        assert!(distribution_by_category(&[]).is_empty());
    }

    #[test]
    fn test_distribution_counts_sum_to_len() {
        let readings = vec![
            reading("a", 10),
            reading("b", 50),
            reading("c", 51),
            reading("d", 180),
            reading("e", 450),
            reading("f", 20),
        ];
        let counts = distribution_by_category(&readings);

        assert_eq!(counts.values().sum::<usize>(), readings.len());
        assert_eq!(counts[&SeverityCategory::Good], 3);
        assert_eq!(counts[&SeverityCategory::Moderate], 1);
        assert_eq!(counts[&SeverityCategory::Unhealthy], 1);
        assert_eq!(counts[&SeverityCategory::Hazardous], 1);
        assert!(!counts.contains_key(&SeverityCategory::VeryUnhealthy));
        assert!(!counts.contains_key(&SeverityCategory::UnhealthyForSensitive));
    }

    #[test]
    fn test_pollutant_averages_zero_fill() {
        let readings = vec![
            with_pm("a", 60, Some(100.0), None),
            with_pm("b", 80, None, None),
        ];
        let averages = pollutant_averages(&readings);
        let moderate = &averages[&SeverityCategory::Moderate];

        assert_eq!(moderate.members(), 2);
        assert_eq!(moderate.avg_primary_index(), 70.0);
        assert_eq!(moderate.pollutant(PollutantKind::Pm25), 50.0);
        assert_eq!(moderate.pollutant(PollutantKind::Pm10), 0.0);
        assert_eq!(moderate.pollutant(PollutantKind::O3), 0.0);
    }

    #[test]
    fn test_pollutant_averages_only_use_own_category() {
        let readings = vec![
            with_pm("good", 20, Some(10.0), Some(30.0)),
            with_pm("bad", 250, Some(200.0), Some(400.0)),
        ];
        let averages = pollutant_averages(&readings);

        assert_eq!(averages.len(), 2);
        assert_eq!(averages[&SeverityCategory::Good].pollutant(PollutantKind::Pm25), 10.0);
        assert_eq!(
            averages[&SeverityCategory::VeryUnhealthy].pollutant(PollutantKind::Pm10),
            400.0
        );
    }

    #[test]
    fn test_present_averages_exclude_missing() {
        let readings = vec![
            with_pm("a", 60, Some(100.0), None),
            with_pm("b", 80, None, None),
        ];
        let averages = pollutant_present_averages(&readings);
        let moderate = &averages[&SeverityCategory::Moderate];

        assert_eq!(moderate.pollutant(PollutantKind::Pm25), Some(100.0));
        assert_eq!(moderate.pollutant(PollutantKind::Pm10), None);
        assert_eq!(moderate.avg_primary_index(), 70.0);
    }

    #[test]
    fn test_averages_are_order_independent() {
        let forward = vec![
            with_pm("a", 60, Some(30.0), Some(10.0)),
            with_pm("b", 120, Some(90.0), None),
            with_pm("c", 70, None, Some(50.0)),
        ];
        let mut backward = forward.clone();
        backward.reverse();

        assert_eq!(pollutant_averages(&forward), pollutant_averages(&backward));
        assert_eq!(distribution_by_category(&forward), distribution_by_category(&backward));
    }

    #[test]
    fn test_top_by_index_stable_descending() {
        let readings = vec![
            reading("a", 40),
            reading("b", 90),
            reading("c", 40),
            reading("d", 200),
            reading("e", 90),
        ];
        let top = top_by_index(&readings, 10);
        let names: Vec<&str> = top.iter().map(|r| r.name.as_str()).collect();

        assert_eq!(names, vec!["d", "b", "e", "a", "c"]);
    }

    #[test]
    fn test_top_by_index_truncates() {
        let readings = vec![reading("a", 1), reading("b", 3), reading("c", 2)];
        let top = top_by_index(&readings, 2);

        assert_eq!(top.len(), 2);
        assert_eq!(top[0].name, "b");
        assert_eq!(top[1].name, "c");
        assert!(top_by_index(&readings, 0).is_empty());
        assert!(top_by_index(&[], 5).is_empty());
    }

    #[test]
    fn test_pollutant_correlation_requires_both() {
        let readings = vec![
            with_pm("both", 80, Some(40.0), Some(70.0)),
            with_pm("pm25 only", 80, Some(40.0), None),
            with_pm("zero pm10", 80, Some(40.0), Some(0.0)),
            with_pm("zero aqi", 0, Some(40.0), Some(70.0)),
        ];
        let points = pollutant_correlation(&readings);

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].station, "both");
        assert_eq!(points[0].pm10, 70.0);
    }

    #[test]
    fn test_mappable_filters_missing_coordinates() {
        let mut no_lon = reading("no lon", 10);
        no_lon.longitude = None;
        let readings = vec![reading("ok", 10), no_lon];

        let names: Vec<&str> = mappable(&readings).map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["ok"]);
    }

    #[test]
    fn test_report_average_entries_carry_color() {
        let report = build_report(&[reading("a", 120)], 5);
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["averages"][0]["category"], "Unhealthy for Sensitive Groups");
        assert_eq!(json["averages"][0]["color"], "#ff7e00");
    }

    #[test]
    fn test_build_report_empty() {
        let report = build_report(&[], 10);

        assert_eq!(report.station_count, 0);
        assert!(report.distribution.is_empty());
        assert!(report.averages.is_empty());
        assert!(report.top_stations.is_empty());
        assert!(report.correlation.is_empty());
    }

    #[test]
    fn test_build_report_orders_categories() {
        let readings = vec![reading("x", 400), reading("y", 10), reading("z", 120)];
        let report = build_report(&readings, 2);

        let categories: Vec<SeverityCategory> =
            report.distribution.iter().map(|c| c.category).collect();
        assert_eq!(
            categories,
            vec![
                SeverityCategory::Good,
                SeverityCategory::UnhealthyForSensitive,
                SeverityCategory::Hazardous,
            ]
        );
        assert_eq!(report.distribution[2].color, "#7e0023");
        assert_eq!(report.averages.len(), 3);
        assert_eq!(report.averages[1].category, SeverityCategory::UnhealthyForSensitive);
        assert_eq!(report.averages[1].color, "#ff7e00");
        assert_eq!(report.top_stations.len(), 2);
        assert_eq!(report.top_stations[0].station, "x");
        assert_eq!(report.mappable_count, 3);
    }
}
