use super::id::AttributeId;
use super::value::{AttributeValue, ResolvedValue};
use crate::error::{HpkError, Result};
use crate::heap::{ByteSource, HeapReader};
use crate::string_table::HpkStringTable;
use std::fmt;
use std::sync::Arc;

/// What a deferred value needs to resolve: the heap and the string table
/// of the section the attribute came from.
#[derive(Clone, Copy)]
pub struct AttributeContext<'a> {
    pub heap_reader: &'a Arc<dyn HeapReader>,
    pub string_table: &'a HpkStringTable,
}

impl<'a> AttributeContext<'a> {
    pub fn new(heap_reader: &'a Arc<dyn HeapReader>, string_table: &'a HpkStringTable) -> Self {
        Self {
            heap_reader,
            string_table,
        }
    }
}

impl fmt::Debug for AttributeContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttributeContext")
            .field("heap_size", &self.heap_reader.size())
            .field("string_table", self.string_table)
            .finish()
    }
}

/// One node of an attribute tree. Children keep file order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Attribute {
    id: AttributeId,
    value: AttributeValue,
    children: Vec<Attribute>,
}

impl Attribute {
    /// Build a leaf, checking the value suits the id's declared type.
    pub fn new(id: AttributeId, value: impl Into<AttributeValue>) -> Result<Self> {
        let value = value.into();
        if value.attribute_type() != id.attribute_type() {
            return Err(HpkError::Precondition(format!(
                "attribute {} holds {} values, not {}",
                id.name(),
                id.attribute_type(),
                value.attribute_type()
            )));
        }
        if !value.fits_width() {
            return Err(HpkError::Precondition(format!(
                "value {value:?} for {} does not fit its width",
                id.name()
            )));
        }
        Ok(Self {
            id,
            value,
            children: Vec::new(),
        })
    }

    /// Build a node straight from decoded parts; the decoder has already
    /// validated the type.
    pub(crate) fn decoded(id: AttributeId, value: AttributeValue, children: Vec<Attribute>) -> Self {
        Self {
            id,
            value,
            children,
        }
    }

    pub fn with_child(mut self, child: Attribute) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: impl IntoIterator<Item = Attribute>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn id(&self) -> AttributeId {
        self.id
    }

    /// The value in wire form.
    pub fn raw(&self) -> &AttributeValue {
        &self.value
    }

    pub fn children(&self) -> &[Attribute] {
        &self.children
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// First child with `id`.
    pub fn child(&self, id: AttributeId) -> Option<&Attribute> {
        self.children.iter().find(|child| child.id == id)
    }

    pub fn children_with(&self, id: AttributeId) -> impl Iterator<Item = &Attribute> {
        self.children.iter().filter(move |child| child.id == id)
    }

    pub fn require_child(&self, id: AttributeId) -> Result<&Attribute> {
        self.child(id).ok_or(HpkError::MissingAttribute(id.name()))
    }

    pub fn value(&self, context: &AttributeContext<'_>) -> Result<ResolvedValue> {
        Ok(match &self.value {
            AttributeValue::Int { value, .. } => ResolvedValue::Int(*value),
            AttributeValue::UInt { value, .. } => ResolvedValue::UInt(*value),
            AttributeValue::InlineString(value) => ResolvedValue::String(value.clone()),
            AttributeValue::TableString(index) => {
                ResolvedValue::String(context.string_table.get_string(*index)?)
            }
            AttributeValue::InlineRaw(data) => ResolvedValue::Raw(ByteSource::from(data.as_slice())),
            AttributeValue::HeapRaw(coordinates) => ResolvedValue::Raw(ByteSource::Heap {
                reader: Arc::clone(context.heap_reader),
                coordinates: *coordinates,
            }),
        })
    }

    pub fn string_value(&self, context: &AttributeContext<'_>) -> Result<String> {
        match &self.value {
            AttributeValue::InlineString(value) => Ok(value.clone()),
            AttributeValue::TableString(index) => context.string_table.get_string(*index),
            _ => Err(self.unexpected("a string")),
        }
    }

    pub fn int_value(&self) -> Result<i64> {
        match self.value {
            AttributeValue::Int { value, .. } => Ok(value),
            AttributeValue::UInt { value, .. } => {
                i64::try_from(value).map_err(|_| self.unexpected("a signed 64-bit integer"))
            }
            _ => Err(self.unexpected("an integer")),
        }
    }

    pub fn uint_value(&self) -> Result<u64> {
        match self.value {
            AttributeValue::UInt { value, .. } => Ok(value),
            AttributeValue::Int { value, .. } => {
                u64::try_from(value).map_err(|_| self.unexpected("a non-negative integer"))
            }
            _ => Err(self.unexpected("an integer")),
        }
    }

    pub fn raw_value(&self, context: &AttributeContext<'_>) -> Result<ByteSource> {
        match self.value(context)? {
            ResolvedValue::Raw(source) => Ok(source),
            _ => Err(self.unexpected("raw data")),
        }
    }

    fn unexpected(&self, expected: &'static str) -> HpkError {
        HpkError::UnexpectedValue {
            id: self.id.name(),
            expected,
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.id.name(), self.value.data_type().name())
    }
}
