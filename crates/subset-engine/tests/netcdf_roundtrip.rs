//! The netCDF backend must answer a query exactly like the in-memory
//! backend over the same fixture.

#![cfg(feature = "netcdf")]

use geo::polygon;

use dataset_access::{DatasetSchema, DatasetSource};
use subset_common::{CfDate, TimeSelection};
use subset_engine::{subset, SubsetOptions};
use test_utils::FixtureSpec;

#[test]
fn netcdf_and_memory_backends_agree() {
    let spec = FixtureSpec {
        days: 3,
        nlevels: 2,
        constant: None,
        ..Default::default()
    };
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.nc");
    spec.write_netcdf(&path).unwrap();

    let polygon = polygon![
        (x: 5.0, y: 5.0),
        (x: 28.0, y: 5.0),
        (x: 28.0, y: 33.0),
        (x: 5.0, y: 33.0),
    ];
    let time = TimeSelection::range(CfDate::new(2000, 1, 1), CfDate::new(2000, 1, 3));
    let options = SubsetOptions {
        clip: true,
        levels: Some(vec![0, 1]),
        ..Default::default()
    };

    let from_file = subset(
        DatasetSource::netcdf(path.to_string_lossy().into_owned()),
        DatasetSchema::default(),
        "Prcp",
        std::slice::from_ref(&polygon),
        &time,
        options.clone(),
    )
    .unwrap();
    let from_memory = subset(
        DatasetSource::memory(spec.build_memory().unwrap()),
        DatasetSchema::default(),
        "Prcp",
        std::slice::from_ref(&polygon),
        &time,
        options,
    )
    .unwrap();

    assert!(!from_file.is_empty());
    assert_eq!(from_file.len(), from_memory.len());
    for (a, b) in from_file.iter().zip(&from_memory) {
        assert_eq!(a.timestamp, b.timestamp);
        assert_eq!(a.level, b.level);
        assert!((a.value - b.value).abs() < 1e-9);
        assert!((a.area() - b.area()).abs() < 1e-9);
    }
}
