//! Record mapping.
//!
//! Maps caller field names onto simulation variables with an explicit
//! builder, then hands each decoded batch back as a [`MappedRecord`] that can
//! be read by field name or converted into a caller type through
//! [`FromRecord`].
//!
//! ```
//! use simlink_client::mapping::RecordMapping;
//!
//! let mapping = RecordMapping::builder()
//!     .describe("altitude", "PLANE ALTITUDE", "Feet")
//!     .describe("on_ground", "SIM ON GROUND", "Bool")
//!     .build()
//!     .unwrap_or_default();
//! assert_eq!(mapping.len(), 2);
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use simlink_protocol::{DecodedVariable, VariableDescriptor};

use crate::error::{ClientError, ClientResult};

#[derive(Debug, Clone, PartialEq)]
struct FieldMapping {
    field: String,
    descriptor: VariableDescriptor,
}

/// Field-to-variable mapping for one record type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordMapping {
    fields: Vec<FieldMapping>,
}

impl RecordMapping {
    /// Start a new mapping
    pub fn builder() -> RecordMappingBuilder {
        RecordMappingBuilder::default()
    }

    /// Number of mapped fields
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the mapping has no fields
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in declaration order
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.field.as_str())
    }

    /// Descriptors in declaration order
    pub fn descriptors(&self) -> Vec<VariableDescriptor> {
        self.fields.iter().map(|f| f.descriptor.clone()).collect()
    }

    /// Field names at the given declaration positions
    pub(crate) fn fields_at(&self, positions: &[usize]) -> Arc<[String]> {
        positions
            .iter()
            .filter_map(|&i| self.fields.get(i).map(|f| f.field.clone()))
            .collect()
    }
}

/// Builder for [`RecordMapping`].
#[derive(Debug, Default)]
pub struct RecordMappingBuilder {
    fields: Vec<FieldMapping>,
}

impl RecordMappingBuilder {
    /// Map a field to a read-only variable
    pub fn describe(
        self,
        field: impl Into<String>,
        variable: impl Into<String>,
        unit: impl Into<String>,
    ) -> Self {
        self.describe_variable(field, VariableDescriptor::new(variable, unit))
    }

    /// Map a field to an existing descriptor
    pub fn describe_variable(
        mut self,
        field: impl Into<String>,
        descriptor: VariableDescriptor,
    ) -> Self {
        self.fields.push(FieldMapping {
            field: field.into(),
            descriptor,
        });
        self
    }

    /// Finish the mapping.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Mapping`] if no field was described or a field
    /// name repeats.
    pub fn build(self) -> ClientResult<RecordMapping> {
        if self.fields.is_empty() {
            return Err(ClientError::mapping("mapping has no fields"));
        }
        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.field.as_str()) {
                return Err(ClientError::mapping(format!(
                    "field {:?} is described twice",
                    field.field
                )));
            }
        }
        Ok(RecordMapping {
            fields: self.fields,
        })
    }
}

/// One decoded batch addressed by field name.
#[derive(Debug, Clone, PartialEq)]
pub struct MappedRecord {
    fields: Arc<[String]>,
    variables: Vec<DecodedVariable>,
}

impl MappedRecord {
    pub(crate) fn new(fields: Arc<[String]>, variables: Vec<DecodedVariable>) -> Self {
        Self { fields, variables }
    }

    /// Variable mapped to `field`, if that field's variable was accepted
    pub fn get(&self, field: &str) -> Option<&DecodedVariable> {
        let position = self.fields.iter().position(|f| f == field)?;
        self.variables.get(position)
    }

    fn require(&self, field: &str) -> ClientResult<&DecodedVariable> {
        self.get(field)
            .ok_or_else(|| ClientError::mapping(format!("no value for field {field:?}")))
    }

    /// Field read as a 64-bit float
    ///
    /// # Errors
    ///
    /// Returns an error if the field is missing or too short.
    pub fn f64(&self, field: &str) -> ClientResult<f64> {
        Ok(self.require(field)?.as_f64()?)
    }

    /// Field read as radians and converted to degrees
    ///
    /// # Errors
    ///
    /// Returns an error if the field is missing or too short.
    pub fn degrees(&self, field: &str) -> ClientResult<f64> {
        Ok(self.require(field)?.as_degrees()?)
    }

    /// Field read as a 32-bit integer
    ///
    /// # Errors
    ///
    /// Returns an error if the field is missing or too short.
    pub fn i32(&self, field: &str) -> ClientResult<i32> {
        Ok(self.require(field)?.as_i32()?)
    }

    /// Field read as a flag
    ///
    /// # Errors
    ///
    /// Returns an error if the field is missing or too short.
    pub fn bool(&self, field: &str) -> ClientResult<bool> {
        Ok(self.require(field)?.as_bool()?)
    }

    /// Field read as text
    ///
    /// # Errors
    ///
    /// Returns an error if the field is missing.
    pub fn string(&self, field: &str) -> ClientResult<String> {
        Ok(self.require(field)?.as_string())
    }

    /// Convert into a caller type
    ///
    /// # Errors
    ///
    /// Returns whatever the type's [`FromRecord`] implementation reports.
    pub fn decode<T: FromRecord>(&self) -> ClientResult<T> {
        T::from_record(self)
    }

    /// Underlying variables in mapping order
    pub fn variables(&self) -> &[DecodedVariable] {
        &self.variables
    }
}

/// A caller type that can be filled from a [`MappedRecord`].
pub trait FromRecord: Sized {
    /// Mapping describing the variables this type needs
    fn mapping() -> RecordMapping;

    /// Build a value from one record
    ///
    /// # Errors
    ///
    /// Returns an error if a field is missing or malformed.
    fn from_record(record: &MappedRecord) -> ClientResult<Self>;
}
