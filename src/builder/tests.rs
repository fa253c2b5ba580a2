//! Unit tests for the dataset builder.

use std::path::PathBuf;

use super::builder::{Builder, DimensionLength};
use crate::{
    backend::{AttributeOwner, BackendError, Format, MemoryBackend, MemoryDataset},
    errors::errors::ErrorImpl,
    types::types::{Constant, Datum, StorageType, Values, NC_FILL_SHORT},
};

fn builder() -> Builder<MemoryBackend> {
    let mut builder = Builder::new(MemoryBackend, PathBuf::from("test.nc"), Format::Classic);
    builder.begin_dataset("test").unwrap();
    builder
}

fn finish(mut builder: Builder<MemoryBackend>) -> MemoryDataset {
    builder.end_dataset().unwrap().unwrap()
}

fn variable(
    builder: &mut Builder<MemoryBackend>,
    storage_type: StorageType,
    name: &str,
    dims: &[&str],
) {
    builder.set_storage_type(storage_type);
    builder
        .declare_variable(name, dims.iter().map(|d| d.to_string()).collect())
        .unwrap();
}

fn ints(values: &[i32]) -> Vec<Datum> {
    values
        .iter()
        .map(|value| Datum::Const(Constant::Int(*value)))
        .collect()
}

fn text(value: &str) -> Datum {
    Datum::Const(Constant::Text(value.to_string()))
}

#[test]
fn test_begin_dataset_reports_backend_failure() {
    let mut builder = Builder::new(MemoryBackend, PathBuf::new(), Format::Classic);

    let error = builder.begin_dataset("x").unwrap_err();
    assert!(matches!(error, ErrorImpl::Backend(BackendError::Create { .. })));
    assert!(builder.dataset().is_none());
}

#[test]
fn test_begin_dataset_uses_format() {
    let mut builder = Builder::new(MemoryBackend, PathBuf::from("a.nc"), Format::Offset64);
    builder.begin_dataset("a").unwrap();

    assert_eq!(builder.dataset().unwrap().format(), Format::Offset64);
}

#[test]
fn test_declare_dimensions() {
    let mut builder = builder();
    builder.declare_dimension("lat", DimensionLength::Fixed(2.0)).unwrap();
    builder.declare_dimension("time", DimensionLength::Unlimited).unwrap();

    assert_eq!(builder.dimension_count(), 2);
    assert_eq!(builder.unlimited_dimension(), Some("time"));

    let dataset = finish(builder);
    assert_eq!(dataset.dimension("lat").unwrap().len(), 2);
    assert!(dataset.dimension("time").unwrap().is_unlimited());
}

#[test]
fn test_duplicate_dimension() {
    let mut builder = builder();
    builder.declare_dimension("x", DimensionLength::Fixed(1.0)).unwrap();

    assert_eq!(
        builder
            .declare_dimension("x", DimensionLength::Fixed(1.0))
            .unwrap_err(),
        ErrorImpl::DimensionAlreadyDeclared {
            dimension: "x".to_string()
        }
    );
}

#[test]
fn test_second_unlimited_dimension() {
    let mut builder = builder();
    builder.declare_dimension("t1", DimensionLength::Unlimited).unwrap();

    assert_eq!(
        builder
            .declare_dimension("t2", DimensionLength::Unlimited)
            .unwrap_err(),
        ErrorImpl::MultipleUnlimitedDimensions {
            dimension: "t2".to_string()
        }
    );
    assert_eq!(builder.dimension_count(), 1);
}

#[test]
fn test_invalid_dimension_lengths() {
    let mut builder = builder();

    for length in [0.0, -3.0, 2.5] {
        assert!(matches!(
            builder.declare_dimension("x", DimensionLength::Fixed(length)),
            Err(ErrorImpl::InvalidDimensionLength { .. })
        ));
    }

    builder.declare_dimension("x", DimensionLength::Fixed(4.0)).unwrap();
}

#[test]
fn test_declare_variable_checks_dimensions() {
    let mut builder = builder();
    builder.declare_dimension("x", DimensionLength::Fixed(2.0)).unwrap();
    builder.set_storage_type(StorageType::Int);

    assert_eq!(
        builder
            .declare_variable("v", vec!["x".to_string(), "y".to_string()])
            .unwrap_err(),
        ErrorImpl::DimensionNotDeclared {
            dimension: "y".to_string()
        }
    );

    builder.declare_variable("v", vec!["x".to_string()]).unwrap();
    assert_eq!(builder.current_variable(), Some("v"));
    assert!(matches!(
        builder.declare_variable("v", vec![]),
        Err(ErrorImpl::VariableAlreadyDeclared { .. })
    ));
}

#[test]
fn test_unlimited_dimension_must_be_first() {
    let mut builder = builder();
    builder.declare_dimension("time", DimensionLength::Unlimited).unwrap();
    builder.declare_dimension("lat", DimensionLength::Fixed(2.0)).unwrap();
    builder.set_storage_type(StorageType::Float);

    assert_eq!(
        builder
            .declare_variable("bad", vec!["lat".to_string(), "time".to_string()])
            .unwrap_err(),
        ErrorImpl::UnlimitedDimensionNotFirst {
            variable: "bad".to_string(),
            dimension: "time".to_string()
        }
    );
    builder
        .declare_variable("good", vec!["time".to_string(), "lat".to_string()])
        .unwrap();
}

#[test]
fn test_attributes() {
    let mut builder = builder();
    variable(&mut builder, StorageType::Double, "height", &[]);
    variable(&mut builder, StorageType::Int, "other", &[]);

    builder
        .set_attribute(
            AttributeOwner::Variable("height".to_string()),
            "units",
            &[Constant::Text("m".to_string())],
        )
        .unwrap();
    assert_eq!(builder.current_variable(), Some("height"));

    builder
        .set_attribute(
            AttributeOwner::Global,
            "version",
            &[Constant::Int(1), Constant::Double(2.5)],
        )
        .unwrap();

    let dataset = finish(builder);
    assert_eq!(
        dataset.variable("height").unwrap().attribute("units").unwrap().as_text(),
        Some("m".to_string())
    );
    assert_eq!(
        dataset.global_attribute("version").unwrap(),
        &Values::Double(vec![1.0, 2.5])
    );
}

#[test]
fn test_attribute_on_undeclared_variable() {
    let mut builder = builder();

    assert_eq!(
        builder
            .set_attribute(
                AttributeOwner::Variable("nope".to_string()),
                "units",
                &[Constant::Text("m".to_string())],
            )
            .unwrap_err(),
        ErrorImpl::VariableNotDeclared {
            variable: "nope".to_string()
        }
    );
}

#[test]
fn test_fill_value_must_match_type() {
    let mut builder = builder();
    variable(&mut builder, StorageType::Short, "s", &[]);

    let error = builder
        .set_attribute(
            AttributeOwner::Variable("s".to_string()),
            "_FillValue",
            &[Constant::Int(-1)],
        )
        .unwrap_err();
    assert!(matches!(error, ErrorImpl::FillValueMismatch { .. }));

    let error = builder
        .set_attribute(
            AttributeOwner::Variable("s".to_string()),
            "_FillValue",
            &[Constant::Short(-1), Constant::Short(-2)],
        )
        .unwrap_err();
    assert!(matches!(error, ErrorImpl::FillValueMismatch { .. }));
}

#[test]
fn test_write_numeric_data_with_default_fill() {
    let mut builder = builder();
    builder.declare_dimension("x", DimensionLength::Fixed(3.0)).unwrap();
    variable(&mut builder, StorageType::Short, "v", &["x"]);

    builder
        .write_data("v", &[Datum::Const(Constant::Int(5)), Datum::Fill])
        .unwrap();

    let dataset = finish(builder);
    assert_eq!(
        dataset.read("v").unwrap(),
        Values::Short(vec![5, NC_FILL_SHORT, NC_FILL_SHORT])
    );
}

#[test]
fn test_write_numeric_data_with_explicit_fill() {
    let mut builder = builder();
    builder.declare_dimension("x", DimensionLength::Fixed(3.0)).unwrap();
    variable(&mut builder, StorageType::Int, "v", &["x"]);
    builder
        .set_attribute(
            AttributeOwner::Variable("v".to_string()),
            "_FillValue",
            &[Constant::Int(-9)],
        )
        .unwrap();

    builder
        .write_data("v", &[Datum::Fill, Datum::Const(Constant::Int(1))])
        .unwrap();

    let dataset = finish(builder);
    assert_eq!(dataset.read("v").unwrap(), Values::Int(vec![-9, 1, -9]));
}

#[test]
fn test_too_many_values() {
    let mut builder = builder();
    builder.declare_dimension("x", DimensionLength::Fixed(2.0)).unwrap();
    variable(&mut builder, StorageType::Int, "v", &["x"]);

    assert_eq!(
        builder.write_data("v", &ints(&[1, 2, 3])).unwrap_err(),
        ErrorImpl::TooManyValues {
            variable: "v".to_string(),
            expected: 2,
            received: 3
        }
    );
}

#[test]
fn test_record_data_grows_unlimited_dimension() {
    let mut builder = builder();
    builder.declare_dimension("time", DimensionLength::Unlimited).unwrap();
    builder.declare_dimension("x", DimensionLength::Fixed(2.0)).unwrap();
    variable(&mut builder, StorageType::Int, "v", &["time", "x"]);

    builder.write_data("v", &ints(&[1, 2, 3, 4, 5])).unwrap();

    let dataset = finish(builder);
    assert_eq!(dataset.dimension("time").unwrap().len(), 3);
}

#[test]
fn test_write_undeclared_variable() {
    let mut builder = builder();

    assert!(matches!(
        builder.write_data("missing", &ints(&[1])),
        Err(ErrorImpl::VariableNotDeclared { .. })
    ));
}

#[test]
fn test_char_strings_padded_to_last_dimension() {
    let mut builder = builder();
    builder.declare_dimension("n", DimensionLength::Fixed(2.0)).unwrap();
    builder.declare_dimension("len", DimensionLength::Fixed(4.0)).unwrap();
    variable(&mut builder, StorageType::Char, "names", &["n", "len"]);

    builder
        .write_data("names", &[text("ab"), text("cdef")])
        .unwrap();

    let dataset = finish(builder);
    assert_eq!(
        dataset.read("names").unwrap(),
        Values::Char(b"ab\0\0cdef".to_vec())
    );
}

#[test]
fn test_char_fill_marker_is_literal() {
    let mut builder = builder();
    variable(&mut builder, StorageType::Char, "c", &[]);

    builder.write_data("c", &[Datum::Fill]).unwrap();

    let dataset = finish(builder);
    assert_eq!(dataset.read("c").unwrap(), Values::Char(b"_".to_vec()));
}

#[test]
fn test_char_accepts_byte_constants() {
    let mut builder = builder();
    builder.declare_dimension("n", DimensionLength::Fixed(2.0)).unwrap();
    variable(&mut builder, StorageType::Char, "c", &["n"]);

    builder
        .write_data(
            "c",
            &[
                Datum::Const(Constant::Byte(65)),
                Datum::Const(Constant::Byte(66)),
            ],
        )
        .unwrap();

    let dataset = finish(builder);
    assert_eq!(dataset.read("c").unwrap(), Values::Char(b"AB".to_vec()));
}

#[test]
fn test_numeric_variable_rejects_text() {
    let mut builder = builder();
    variable(&mut builder, StorageType::Float, "f", &[]);

    assert!(matches!(
        builder.write_data("f", &[text("abc")]),
        Err(ErrorImpl::TypeMatchError { .. })
    ));
}

#[test]
fn test_end_dataset_is_idempotent() {
    let mut builder = builder();

    let dataset = builder.end_dataset().unwrap().unwrap();
    assert!(!dataset.is_open());
    assert!(builder.end_dataset().unwrap().is_none());
}

#[test_log::test]
fn test_abort_drops_dataset() {
    let mut builder = builder();
    builder.declare_dimension("x", DimensionLength::Fixed(1.0)).unwrap();

    builder.abort();
    assert!(builder.dataset().is_none());
    assert_eq!(
        builder
            .declare_dimension("y", DimensionLength::Fixed(1.0))
            .unwrap_err(),
        ErrorImpl::Backend(BackendError::Closed)
    );
}

#[test]
fn test_variable_size_overflow() {
    let mut builder = builder();
    builder
        .declare_dimension("t", DimensionLength::Unlimited)
        .unwrap();
    for name in ["a", "b", "c"] {
        builder
            .declare_dimension(name, DimensionLength::Fixed(4294967295.0))
            .unwrap();
    }
    builder.set_storage_type(StorageType::Byte);

    let dims = |names: &[&str]| names.iter().map(|n| n.to_string()).collect::<Vec<_>>();
    assert_eq!(
        builder
            .declare_variable("v", dims(&["a", "b", "c"]))
            .unwrap_err(),
        ErrorImpl::VariableTooLarge {
            variable: "v".to_string()
        }
    );
    assert_eq!(
        builder
            .declare_variable("r", dims(&["t", "a", "b", "c"]))
            .unwrap_err(),
        ErrorImpl::VariableTooLarge {
            variable: "r".to_string()
        }
    );
}
