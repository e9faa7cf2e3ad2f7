//! Shared fixtures for the integration tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const ORDER_XSD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema">
    <xs:element name="order">
        <xs:complexType>
            <xs:sequence>
                <xs:element name="customer" type="xs:string"/>
                <xs:element name="quantity">
                    <xs:simpleType>
                        <xs:restriction base="xs:integer">
                            <xs:minInclusive value="1"/>
                            <xs:maxInclusive value="100"/>
                        </xs:restriction>
                    </xs:simpleType>
                </xs:element>
                <xs:element name="express" type="xs:boolean"/>
            </xs:sequence>
            <xs:attribute name="id" type="xs:string" use="required"/>
        </xs:complexType>
    </xs:element>
</xs:schema>"#;

pub const VALID_ORDER: &str = r#"<?xml version="1.0"?>
<order id="o-1">
  <customer>Ada</customer>
  <quantity>3</quantity>
  <express>true</express>
</order>"#;

/// `quantity` is not an integer
pub const TYPE_ERROR_ORDER: &str = r#"<?xml version="1.0"?>
<order id="o-2">
  <customer>Ada</customer>
  <quantity>many</quantity>
  <express>true</express>
</order>"#;

/// `customer` is missing
pub const MISSING_CHILD_ORDER: &str = r#"<?xml version="1.0"?>
<order id="o-3">
  <quantity>3</quantity>
  <express>false</express>
</order>"#;

/// `id` is missing
pub const MISSING_ATTRIBUTE_ORDER: &str = r#"<?xml version="1.0"?>
<order>
  <customer>Ada</customer>
  <quantity>3</quantity>
  <express>true</express>
</order>"#;

/// `quantity` breaks the maxInclusive facet
pub const OUT_OF_RANGE_ORDER: &str = r#"<?xml version="1.0"?>
<order id="o-5">
  <customer>Ada</customer>
  <quantity>500</quantity>
  <express>true</express>
</order>"#;

/// Not well-formed
pub const MALFORMED_ORDER: &str = r#"<?xml version="1.0"?>
<order id="o-6">
  <customer>Ada</customer>
"#;

/// Temporary directory holding a schema and documents on disk
pub struct Workspace {
    pub dir: TempDir,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create fixture dir");
        }
        std::fs::write(&path, content).expect("write fixture");
        path
    }

    pub fn schema(&self) -> PathBuf {
        self.write("order.xsd", ORDER_XSD)
    }
}
