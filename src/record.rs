//! # Record Layout and Codec
//!
//! A [`Record`] is one logical row of the store. On disk every record
//! occupies exactly [`RECORD_SIZE`] bytes in a fixed little-endian layout:
//!
//! ```text
//! Offset  Size  Field     Encoding
//! ------  ----  --------  ----------------------------------------
//! 0       4     id        int32, the unique sort key
//! 4       40    name      UTF-8 bytes, right-padded with NUL
//! 44      4     quantity  int32
//! 48      4     price     IEEE 754 float32
//! 52      15    date      UTF-8 bytes, right-padded with NUL
//! ```
//!
//! Text wider than its declared field is truncated at a character
//! boundary, never rejected. Decoding trims the NUL padding back off, so
//! `decode(encode(r)) == r` holds whenever the text was within width.
//!
//! The fixed width is what makes O(1) page addressing possible: a page's
//! byte size is a pure function of the block factor, and a record slot's
//! offset is a pure function of its slot index.

/// Byte width of the `name` field.
pub const NAME_WIDTH: usize = 40;

/// Byte width of the `date` field.
pub const DATE_WIDTH: usize = 15;

/// Encoded size of one record: 4 + 40 + 4 + 4 + 15.
pub const RECORD_SIZE: usize = 4 + NAME_WIDTH + 4 + 4 + DATE_WIDTH;

#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: i32,
    pub name: String,
    pub quantity: i32,
    pub price: f32,
    pub date: String,
}

impl Record {
    /// Builds a record, truncating `name` and `date` to their field widths.
    pub fn new(
        id: i32,
        name: impl Into<String>,
        quantity: i32,
        price: f32,
        date: impl Into<String>,
    ) -> Self {
        let mut name = name.into();
        let mut date = date.into();
        truncate_to_width(&mut name, NAME_WIDTH);
        truncate_to_width(&mut date, DATE_WIDTH);

        Self {
            id,
            name,
            quantity,
            price,
            date,
        }
    }

    /// Packs the record into its fixed on-disk layout.
    ///
    /// Oversized text (possible when the struct was built literally instead
    /// of through [`Record::new`]) is truncated here as well; truncation is
    /// the codec's documented lossy behavior, never an error.
    pub fn encode(&self) -> [u8; RECORD_SIZE] {
        let mut buf = [0u8; RECORD_SIZE];

        buf[0..4].copy_from_slice(&self.id.to_le_bytes());
        pack_text(&self.name, &mut buf[4..4 + NAME_WIDTH]);
        buf[44..48].copy_from_slice(&self.quantity.to_le_bytes());
        buf[48..52].copy_from_slice(&self.price.to_le_bytes());
        pack_text(&self.date, &mut buf[52..52 + DATE_WIDTH]);

        buf
    }

    /// Unpacks a record from its fixed on-disk layout.
    ///
    /// Infallible: the page codec hands this exactly [`RECORD_SIZE`] bytes,
    /// and any byte content decodes to *some* record (invalid UTF-8 in text
    /// fields is replaced lossily).
    pub fn decode(buf: &[u8; RECORD_SIZE]) -> Self {
        let id = i32::from_le_bytes(buf[0..4].try_into().unwrap());
        let name = unpack_text(&buf[4..4 + NAME_WIDTH]);
        let quantity = i32::from_le_bytes(buf[44..48].try_into().unwrap());
        let price = f32::from_le_bytes(buf[48..52].try_into().unwrap());
        let date = unpack_text(&buf[52..52 + DATE_WIDTH]);

        Self {
            id,
            name,
            quantity,
            price,
            date,
        }
    }
}

/// Shortens `s` in place to at most `width` bytes, on a char boundary.
fn truncate_to_width(s: &mut String, width: usize) {
    if s.len() <= width {
        return;
    }
    let mut end = width;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    s.truncate(end);
}

fn pack_text(s: &str, field: &mut [u8]) {
    let mut end = s.len().min(field.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    field[..end].copy_from_slice(&s.as_bytes()[..end]);
}

fn unpack_text(field: &[u8]) -> String {
    let end = field.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    String::from_utf8_lossy(&field[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_size_is_67_bytes() {
        assert_eq!(RECORD_SIZE, 67);
    }

    #[test]
    fn encode_decode_roundtrip() {
        let original = Record::new(42, "Voltage Stabilizer", 25, 192.26, "2024-10-21");
        let decoded = Record::decode(&original.encode());

        assert_eq!(decoded, original);
    }

    #[test]
    fn roundtrip_preserves_negative_id_and_quantity() {
        let original = Record::new(-7, "x", -3, -0.5, "2024-01-01");
        let decoded = Record::decode(&original.encode());

        assert_eq!(decoded.id, -7);
        assert_eq!(decoded.quantity, -3);
        assert_eq!(decoded.price, -0.5);
    }

    #[test]
    fn new_truncates_oversized_name() {
        let long_name = "a".repeat(100);
        let record = Record::new(1, long_name, 0, 0.0, "2024-01-01");

        assert_eq!(record.name.len(), NAME_WIDTH);
    }

    #[test]
    fn new_truncates_on_char_boundary() {
        // 'é' is two bytes; 39 ASCII bytes + 'é' would split at byte 40
        let name = format!("{}é", "a".repeat(39));
        let record = Record::new(1, name, 0, 0.0, "2024-01-01");

        assert_eq!(record.name, "a".repeat(39));
    }

    #[test]
    fn encode_truncates_literally_built_record() {
        let record = Record {
            id: 1,
            name: "b".repeat(200),
            quantity: 0,
            price: 0.0,
            date: "2024-01-01".to_string(),
        };
        let decoded = Record::decode(&record.encode());

        assert_eq!(decoded.name, "b".repeat(NAME_WIDTH));
    }

    #[test]
    fn decode_trims_nul_padding() {
        let record = Record::new(9, "short", 1, 1.0, "2024-02-02");
        let bytes = record.encode();

        // padding bytes after the text are zero
        assert!(bytes[4 + 5..4 + NAME_WIDTH].iter().all(|&b| b == 0));

        let decoded = Record::decode(&bytes);
        assert_eq!(decoded.name, "short");
        assert_eq!(decoded.date, "2024-02-02");
    }

    #[test]
    fn decode_zeroed_slot_yields_empty_text() {
        let decoded = Record::decode(&[0u8; RECORD_SIZE]);

        assert_eq!(decoded.id, 0);
        assert_eq!(decoded.name, "");
        assert_eq!(decoded.date, "");
    }
}
