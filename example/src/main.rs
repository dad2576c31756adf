// example/src/main.rs

use std::collections::BTreeMap;

use gbin::*;
use gbin_schema::Schema;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Color {
    red:   u8,
    green: u8,
    blue:  u8,
    alpha: u8,
}

impl ToGbin for Color {
    fn to_gbin(&self) -> Result<Value, GbinError> {
        Ok(RecordBuilder::new()
            .field("red", &self.red)?
            .field("green", &self.green)?
            .field("blue", &self.blue)?
            .field("alpha", &self.alpha)?
            .build())
    }
}

impl FromGbin for Color {
    fn schema() -> Schema {
        record_schema(
            "Color",
            &[
                ("red", u8::schema()),
                ("green", u8::schema()),
                ("blue", u8::schema()),
                ("alpha", u8::schema()),
            ],
        )
    }

    fn from_gbin(value: &Value) -> Result<Self, GbinError> {
        let r = RecordReader::new("Color", value)?;
        Ok(Color {
            red:   r.field("red")?,
            green: r.field("green")?,
            blue:  r.field("blue")?,
            alpha: r.field("alpha")?,
        })
    }
}

#[derive(Debug, PartialEq)]
struct Palette {
    client_id: u32,
    colors:    Vec<Color>,
    labels:    BTreeMap<String, Box<Color>>,
}

impl ToGbin for Palette {
    fn to_gbin(&self) -> Result<Value, GbinError> {
        Ok(RecordBuilder::new()
            .field("clientID", &self.client_id)?
            .field("colors", &self.colors)?
            .field("labels", &self.labels)?
            .build())
    }
}

impl FromGbin for Palette {
    fn schema() -> Schema {
        record_schema(
            "Palette",
            &[
                ("clientID", u32::schema()),
                ("colors", Vec::<Color>::schema()),
                ("labels", BTreeMap::<String, Box<Color>>::schema()),
            ],
        )
    }

    fn from_gbin(value: &Value) -> Result<Self, GbinError> {
        let r = RecordReader::new("Palette", value)?;
        Ok(Palette {
            client_id: r.field("clientID")?,
            colors:    r.field("colors")?,
            labels:    r.field("labels")?,
        })
    }
}

/// The subset of a palette an older reader cares about.
#[derive(Debug)]
struct PaletteSummary {
    client_id: u8,
}

impl FromGbin for PaletteSummary {
    fn schema() -> Schema {
        record_schema("PaletteSummary", &[("clientID", u8::schema())])
    }

    fn from_gbin(value: &Value) -> Result<Self, GbinError> {
        let r = RecordReader::new("PaletteSummary", value)?;
        Ok(PaletteSummary { client_id: r.field("clientID")? })
    }
}

#[derive(Serialize)]
struct Report<'a> {
    bytes:  usize,
    schema: &'a Schema,
}

fn main() -> Result<(), GbinError> {
    let red = Color { red: 200, green: 10, blue: 10, alpha: 255 };
    let sky = Color { red: 10, green: 100, blue: 220, alpha: 128 };

    let mut labels = BTreeMap::new();
    labels.insert("warning".to_owned(), Box::new(red));

    let palette = Palette {
        client_id: 123,
        colors:    vec![red, sky],
        labels,
    };

    let bytes = encode(&palette)?;
    let decoded: Palette = decode(&bytes)?;
    assert_eq!(decoded, palette);

    println!("clientID = {}", decoded.client_id);
    println!("colors.len() = {}", decoded.colors.len());
    for (i, c) in decoded.colors.iter().enumerate() {
        println!(
            "  Color[{}] = (r={}, g={}, b={}, a={})",
            i, c.red, c.green, c.blue, c.alpha
        );
    }

    // Fields the summary does not name are dropped; 123 fits in a u8.
    let summary: PaletteSummary = decode(&bytes)?;
    println!("summary = {:?}", summary);

    // The untyped view shows what the bytes alone describe.
    println!("decoded tree = {:?}", decode_value(&bytes)?);

    let schema = Palette::schema();
    let report = Report { bytes: bytes.len(), schema: &schema };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
