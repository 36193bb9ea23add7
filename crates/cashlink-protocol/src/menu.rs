//! ASCII tag/sub-tag menu command bodies (scanner configuration writes).
//!
//! # Wire grammar
//!
//! ```text
//! START PREFIX class { ';' tag sub data } { ',' sub data } ';' END
//! ```
//!
//! Tags and sub-tags are two ASCII bytes each; data runs to the next
//! delimiter. Consecutive entries sharing a tag are compressed: the full
//! `';' tag sub` form is emitted only when the tag changes, otherwise the
//! entry is `',' sub`. The encoding is symmetric: [`MenuCommand::decode`]
//! reverses [`MenuCommand::encode`] exactly, including the compression.
//!
//! # Example
//!
//! ```
//! use cashlink_core::StorageClass;
//! use cashlink_protocol::{MenuCommand, MenuEntry};
//!
//! let menu = MenuCommand::new(
//!     StorageClass::Permanent,
//!     vec![
//!         MenuEntry::new(*b"EA", *b"08", b"1").unwrap(),
//!         MenuEntry::new(*b"EA", *b"13", b"0").unwrap(),
//!         MenuEntry::new(*b"PF", *b"01", b"250").unwrap(),
//!     ],
//! );
//!
//! let wire = menu.encode().unwrap();
//! // \x02 C 1 ;EA081 ,EA130 -> ,130   ;PF01250 ; \x03
//! assert_eq!(&wire, b"\x02C1;EA081,130;PF01250;\x03");
//!
//! let back = MenuCommand::decode(&wire).unwrap();
//! assert_eq!(back, menu);
//! ```

use cashlink_core::constants::{
    MENU_DELIM_SUB, MENU_DELIM_TAG, MENU_END, MENU_PREFIX, MENU_START, MENU_SUB_TAG_LEN,
    MENU_TAG_LEN,
};
use cashlink_core::{Error, Result, StorageClass};
use std::fmt;

/// One `tag.sub-tag = data` configuration entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuEntry {
    tag: [u8; MENU_TAG_LEN],
    sub_tag: [u8; MENU_SUB_TAG_LEN],
    data: Vec<u8>,
}

impl MenuEntry {
    /// Create an entry, validating that every byte is representable.
    ///
    /// Tags and sub-tags must be ASCII alphanumeric; data must be printable
    /// ASCII free of the entry delimiters, or parsing the echoed body back
    /// would split in the wrong place.
    pub fn new(
        tag: [u8; MENU_TAG_LEN],
        sub_tag: [u8; MENU_SUB_TAG_LEN],
        data: impl AsRef<[u8]>,
    ) -> Result<Self> {
        for &b in tag.iter().chain(sub_tag.iter()) {
            if !b.is_ascii_alphanumeric() {
                return Err(Error::invalid_menu_body(format!(
                    "tag byte {b:#04x} is not ASCII alphanumeric"
                )));
            }
        }

        let data = data.as_ref();
        for &b in data {
            if !b.is_ascii_graphic() || b == MENU_DELIM_TAG || b == MENU_DELIM_SUB {
                return Err(Error::invalid_menu_body(format!(
                    "data byte {b:#04x} is not representable"
                )));
            }
        }

        Ok(MenuEntry {
            tag,
            sub_tag,
            data: data.to_vec(),
        })
    }

    /// Two-byte tag.
    #[must_use]
    pub fn tag(&self) -> [u8; MENU_TAG_LEN] {
        self.tag
    }

    /// Two-byte sub-tag.
    #[must_use]
    pub fn sub_tag(&self) -> [u8; MENU_SUB_TAG_LEN] {
        self.sub_tag
    }

    /// Argument bytes (may be empty).
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

impl fmt::Display for MenuEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}.{}{}={}",
            self.tag[0] as char,
            self.tag[1] as char,
            self.sub_tag[0] as char,
            self.sub_tag[1] as char,
            String::from_utf8_lossy(&self.data)
        )
    }
}

/// A complete menu command: storage class plus ordered entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuCommand {
    storage: StorageClass,
    entries: Vec<MenuEntry>,
}

impl MenuCommand {
    /// Create a menu command.
    pub fn new(storage: StorageClass, entries: Vec<MenuEntry>) -> Self {
        MenuCommand { storage, entries }
    }

    /// Storage class of the write.
    #[must_use]
    pub fn storage(&self) -> StorageClass {
        self.storage
    }

    /// Entries in emission order.
    #[must_use]
    pub fn entries(&self) -> &[MenuEntry] {
        &self.entries
    }

    /// Encode to the wire body, applying the tag-compression rule.
    ///
    /// # Errors
    ///
    /// Entries are validated at construction, so this only fails if the
    /// body would be empty of framing, which cannot happen; the signature
    /// stays fallible to match [`Self::decode`].
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(8 + self.entries.len() * 8);
        out.push(MENU_START);
        out.push(MENU_PREFIX);
        out.push(self.storage.to_wire());

        let mut previous_tag: Option<[u8; MENU_TAG_LEN]> = None;
        for entry in &self.entries {
            if previous_tag == Some(entry.tag) {
                out.push(MENU_DELIM_SUB);
            } else {
                out.push(MENU_DELIM_TAG);
                out.extend_from_slice(&entry.tag);
                previous_tag = Some(entry.tag);
            }
            out.extend_from_slice(&entry.sub_tag);
            out.extend_from_slice(&entry.data);
        }

        out.push(MENU_DELIM_TAG);
        out.push(MENU_END);
        Ok(out)
    }

    /// Parse a wire body back into its storage class and entries,
    /// expanding compressed tags.
    ///
    /// # Errors
    ///
    /// Returns an error on a broken envelope, an unknown storage class, a
    /// sub-tag entry with no preceding tag, or a truncated entry.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        const MIN: usize = 5; // START PREFIX class ';' END

        if bytes.len() < MIN {
            return Err(Error::FrameTooShort {
                len: bytes.len(),
                min: MIN,
            });
        }
        if bytes[0] != MENU_START || bytes[1] != MENU_PREFIX {
            return Err(Error::invalid_menu_body("missing start/prefix"));
        }
        if bytes[bytes.len() - 1] != MENU_END || bytes[bytes.len() - 2] != MENU_DELIM_TAG {
            return Err(Error::invalid_menu_body("missing trailing delimiter/end"));
        }

        let storage = StorageClass::from_wire(bytes[2])?;
        let body = &bytes[3..bytes.len() - 2];

        let mut entries = Vec::new();
        let mut previous_tag: Option<[u8; MENU_TAG_LEN]> = None;
        let mut i = 0;
        while i < body.len() {
            let (tag, sub_start) = match body[i] {
                MENU_DELIM_TAG => {
                    let tag_end = i + 1 + MENU_TAG_LEN;
                    let tag: [u8; MENU_TAG_LEN] = body
                        .get(i + 1..tag_end)
                        .and_then(|s| s.try_into().ok())
                        .ok_or_else(|| Error::invalid_menu_body("truncated tag"))?;
                    (tag, tag_end)
                }
                MENU_DELIM_SUB => {
                    let tag = previous_tag.ok_or_else(|| {
                        Error::invalid_menu_body("sub-tag entry with no preceding tag")
                    })?;
                    (tag, i + 1)
                }
                other => {
                    return Err(Error::invalid_menu_body(format!(
                        "expected delimiter, got {other:#04x}"
                    )));
                }
            };

            let data_start = sub_start + MENU_SUB_TAG_LEN;
            let sub_tag: [u8; MENU_SUB_TAG_LEN] = body
                .get(sub_start..data_start)
                .and_then(|s| s.try_into().ok())
                .ok_or_else(|| Error::invalid_menu_body("truncated sub-tag"))?;

            let data_end = body[data_start..]
                .iter()
                .position(|&b| b == MENU_DELIM_TAG || b == MENU_DELIM_SUB)
                .map_or(body.len(), |p| data_start + p);

            entries.push(MenuEntry::new(tag, sub_tag, &body[data_start..data_end])?);
            previous_tag = Some(tag);
            i = data_end;
        }

        Ok(MenuCommand { storage, entries })
    }
}
