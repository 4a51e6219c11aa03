use ab_glyph::{FontArc, FontVec};
use anyhow::{Context, Result, anyhow};
use fontdb::{Database, Family, ID, Query};
use tracing::{debug, trace};

/// Label fonts in order of preference; the generic family catches everything else.
const LABEL_FAMILIES: [Family<'static>; 4] = [
    Family::Name("Inter"),
    Family::Name("Noto Sans"),
    Family::Name("DejaVu Sans"),
    Family::SansSerif,
];

/// Picks a sans-serif system font for the frequency labels.
pub fn load_font() -> Result<FontArc> {
    let mut db = Database::new();
    db.load_system_fonts();
    if db.is_empty() {
        return Err(anyhow!("no system fonts installed"));
    }

    let preferred = LABEL_FAMILIES.iter().filter_map(|family| {
        db.query(&Query {
            families: std::slice::from_ref(family),
            ..Default::default()
        })
    });
    let candidates = preferred.chain(db.faces().map(|face| face.id));

    for id in candidates {
        match load_face(&db, id) {
            Ok(font) => {
                debug!(face = ?db.face(id).map(|f| &f.post_script_name), "loaded label font");
                return Ok(font);
            }
            Err(err) => trace!(error = %err, "skipping font face"),
        }
    }
    Err(anyhow!("no usable system font found for palette labels"))
}

fn load_face(db: &Database, id: ID) -> Result<FontArc> {
    let font = db
        .with_face_data(id, |data, index| FontVec::try_from_vec_and_index(data.to_vec(), index))
        .context("font face vanished from the database")?
        .context("failed to decode font face")?;
    Ok(FontArc::new(font))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_face_is_an_error() {
        let err = load_face(&Database::new(), ID::dummy()).unwrap_err();
        assert!(format!("{err:#}").contains("vanished"));
    }
}
