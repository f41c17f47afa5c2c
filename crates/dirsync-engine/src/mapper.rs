use dirsync_types::{AttributeMap, MappedRecord, RawAttributes};

/// Translates raw directory attributes into local field values.
pub struct AttributeMapper<'a> {
    table: &'a AttributeMap,
}

impl<'a> AttributeMapper<'a> {
    pub fn new(table: &'a AttributeMap) -> Self {
        Self { table }
    }

    /// Produce one value per configured field.
    ///
    /// The first value of each attribute is decoded as UTF-8. An absent
    /// attribute, an attribute without values, and an undecodable value all
    /// yield an empty string; undecodable attributes are noted on the record.
    pub fn map(&self, attributes: &RawAttributes) -> MappedRecord {
        let mut record = MappedRecord::new();
        for mapping in self.table.iter() {
            let value = match attributes.first(&mapping.ldap) {
                Some(raw) => match std::str::from_utf8(raw) {
                    Ok(text) => text.to_owned(),
                    Err(_) => {
                        record.mark_undecodable(mapping.ldap.clone());
                        String::new()
                    }
                },
                None => String::new(),
            };
            record.set(mapping.field.clone(), value);
        }
        record
    }
}
