//! Built-in constants made available to scripts (§6 "Built-in constants").
//!
//! Page sizes and the color table are looked up by name from script code
//! (`script::eval` resolves an identifier against these tables before
//! falling back to locals/globals), so everything here is plain data, not
//! behavior.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// One PostScript point, the unit every length in the placer is expressed in.
pub type Pt = f32;

pub const INCH: Pt = 72.0;
pub const CM: Pt = INCH / 2.54;
pub const MM: Pt = CM / 10.0;
pub const PICA: Pt = 12.0;

/// `(width_pt, height_pt)`, portrait orientation.
pub type PageSize = (Pt, Pt);

pub const LETTER: PageSize = (8.5 * INCH, 11.0 * INCH);
pub const LEGAL: PageSize = (8.5 * INCH, 14.0 * INCH);
pub const ELEVENSEVENTEEN: PageSize = (11.0 * INCH, 17.0 * INCH);
pub const TABLOID: PageSize = (11.0 * INCH, 17.0 * INCH);
pub const LEDGER: PageSize = (17.0 * INCH, 11.0 * INCH);
pub const HALF_LETTER: PageSize = (5.5 * INCH, 8.5 * INCH);
pub const GOV_LETTER: PageSize = (8.0 * INCH, 10.5 * INCH);
pub const GOV_LEGAL: PageSize = (8.5 * INCH, 13.0 * INCH);
pub const JUNIOR_LEGAL: PageSize = (5.0 * INCH, 8.0 * INCH);

/// ISO A series, indices 0 through 10 (A0 is the largest).
pub const ISO_A: [PageSize; 11] = [
    (2384.0, 3370.0),
    (1684.0, 2384.0),
    (1190.0, 1684.0),
    (842.0, 1190.0),
    (595.0, 842.0),
    (420.0, 595.0),
    (298.0, 420.0),
    (210.0, 298.0),
    (147.0, 210.0),
    (105.0, 147.0),
    (74.0, 105.0),
];

/// ISO B series, indices 0 through 10.
pub const ISO_B: [PageSize; 11] = [
    (2835.0, 4008.0),
    (2004.0, 2835.0),
    (1417.0, 2004.0),
    (1001.0, 1417.0),
    (709.0, 1001.0),
    (499.0, 709.0),
    (354.0, 499.0),
    (249.0, 354.0),
    (176.0, 249.0),
    (125.0, 176.0),
    (88.0, 125.0),
];

/// ISO C series (envelopes), indices 0 through 10.
pub const ISO_C: [PageSize; 11] = [
    (2599.0, 3677.0),
    (1837.0, 2599.0),
    (1298.0, 1837.0),
    (918.0, 1298.0),
    (649.0, 918.0),
    (459.0, 649.0),
    (323.0, 459.0),
    (230.0, 323.0),
    (162.0, 230.0),
    (113.0, 162.0),
    (79.0, 113.0),
];

/// ISO D series (envelopes), indices 0 through 13, the subset for which the
/// standard defines a size.
pub const ISO_D: [PageSize; 14] = [
    (1090.0, 1542.0),
    (771.0, 1090.0),
    (545.0, 771.0),
    (385.0, 545.0),
    (272.0, 385.0),
    (192.0, 272.0),
    (136.0, 192.0),
    (96.0, 136.0),
    (68.0, 96.0),
    (48.0, 68.0),
    (34.0, 48.0),
    (0.0, 0.0),
    (0.0, 0.0),
    (0.0, 0.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Left,
    Center,
    Right,
    Justify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Underline {
    None,
    Single,
    Double,
    Thick,
    Wave,
    Dotted,
    Dashed,
    DotDashed,
    DotDotDashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrikeThrough {
    None,
    Single,
    Double,
}

/// `(red, green, blue, alpha)`, each in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba(pub f32, pub f32, pub f32, pub f32);

impl Rgba {
    pub const fn opaque(r: f32, g: f32, b: f32) -> Self {
        Rgba(r, g, b, 1.0)
    }
}

/// Named CSS colors plus a short supplementary palette, looked up
/// case-insensitively by scripts (§6 "A predefined color table").
pub static COLOR_TABLE: Lazy<HashMap<&'static str, Rgba>> = Lazy::new(|| {
    let mut m = HashMap::new();
    let named: &[(&str, Rgba)] = &[
        ("black", Rgba::opaque(0.0, 0.0, 0.0)),
        ("white", Rgba::opaque(1.0, 1.0, 1.0)),
        ("red", Rgba::opaque(1.0, 0.0, 0.0)),
        ("green", Rgba::opaque(0.0, 0.5019608, 0.0)),
        ("blue", Rgba::opaque(0.0, 0.0, 1.0)),
        ("yellow", Rgba::opaque(1.0, 1.0, 0.0)),
        ("cyan", Rgba::opaque(0.0, 1.0, 1.0)),
        ("magenta", Rgba::opaque(1.0, 0.0, 1.0)),
        ("gray", Rgba::opaque(0.5019608, 0.5019608, 0.5019608)),
        ("grey", Rgba::opaque(0.5019608, 0.5019608, 0.5019608)),
        ("silver", Rgba::opaque(0.7529412, 0.7529412, 0.7529412)),
        ("maroon", Rgba::opaque(0.5019608, 0.0, 0.0)),
        ("olive", Rgba::opaque(0.5019608, 0.5019608, 0.0)),
        ("navy", Rgba::opaque(0.0, 0.0, 0.5019608)),
        ("teal", Rgba::opaque(0.0, 0.5019608, 0.5019608)),
        ("purple", Rgba::opaque(0.5019608, 0.0, 0.5019608)),
        ("orange", Rgba::opaque(1.0, 0.64705884, 0.0)),
        ("pink", Rgba::opaque(1.0, 0.7529412, 0.7960784)),
        ("brown", Rgba::opaque(0.64705884, 0.16470589, 0.16470589)),
        ("gold", Rgba::opaque(1.0, 0.84313726, 0.0)),
        ("transparent", Rgba(0.0, 0.0, 0.0, 0.0)),
    ];
    for &(name, rgba) in named {
        m.insert(name, rgba);
    }
    m
});

pub fn lookup_color(name: &str) -> Option<Rgba> {
    COLOR_TABLE.get(name.to_ascii_lowercase().as_str()).copied()
}

pub fn page_size_by_name(name: &str) -> Option<PageSize> {
    let upper = name.to_ascii_uppercase();
    match upper.as_str() {
        "LETTER" => return Some(LETTER),
        "LEGAL" => return Some(LEGAL),
        "ELEVENSEVENTEEN" => return Some(ELEVENSEVENTEEN),
        "TABLOID" => return Some(TABLOID),
        "LEDGER" => return Some(LEDGER),
        "HALF_LETTER" => return Some(HALF_LETTER),
        "GOV_LETTER" => return Some(GOV_LETTER),
        "GOV_LEGAL" => return Some(GOV_LEGAL),
        "JUNIOR_LEGAL" => return Some(JUNIOR_LEGAL),
        _ => {}
    }
    let (series, rest) = upper.split_at(1);
    let table = match series {
        "A" => &ISO_A[..],
        "B" => &ISO_B[..],
        "C" => &ISO_C[..],
        "D" => &ISO_D[..],
        _ => return None,
    };
    rest.parse::<usize>().ok().and_then(|i| table.get(i)).copied()
}
