//! Merging two tiles into a combo group and splitting it again.

use crate::entry::{AppEntry, EntryKind};
use crate::icons::IconImage;

/// Merges `a` and `b` into one combo. A combo input contributes its
/// children (one level), a leaf contributes itself; `a`'s members come first.
pub fn combine(a: AppEntry, b: AppEntry) -> AppEntry {
    let mut children = splice(a);
    children.extend(splice(b));
    let name = combo_name(&children);
    AppEntry {
        name,
        kind: EntryKind::Combo {
            children,
            icon: None,
        },
    }
}

/// Returns the combo's children as they are; a leaf comes back on its own.
pub fn dissolve(entry: AppEntry) -> Vec<AppEntry> {
    splice(entry)
}

fn splice(entry: AppEntry) -> Vec<AppEntry> {
    match entry.kind {
        EntryKind::Combo { children, .. } => children,
        EntryKind::Leaf { .. } => vec![entry],
    }
}

/// "A + B" for two members, "A + B +N more" beyond that.
pub fn combo_name(children: &[AppEntry]) -> String {
    let mut names = children.iter().map(|c| c.name.trim());
    let base = match (names.next(), names.next()) {
        (Some(first), Some(second)) => format!("{first} + {second}"),
        (Some(first), None) => first.to_string(),
        _ => String::new(),
    };
    if children.len() > 2 {
        format!("{base} +{} more", children.len() - 2)
    } else {
        base
    }
}

/// Packs up to four member icons into a 2x2 tile of `side` pixels.
/// Missing icons leave their quadrant transparent.
pub fn compose_combo_icon(members: &[Option<&IconImage>], side: usize) -> IconImage {
    let side = side.max(2);
    let half = side / 2;
    let gap = (side / 24).max(1);
    let quad = half.saturating_sub(gap).max(1);
    let mut canvas = IconImage::transparent(side, side);

    for (slot, member) in members.iter().take(4).enumerate() {
        let Some(image) = member else {
            continue;
        };
        let scaled = image.resize_to_square(quad);
        let ox = (slot % 2) * half + gap / 2;
        let oy = (slot / 2) * half + gap / 2;
        canvas.blit(&scaled, ox, oy);
    }
    canvas
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(name: &str) -> AppEntry {
        AppEntry::leaf(name, name.to_lowercase())
    }

    fn names(entries: &[AppEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn combine_splices_existing_combo_after_leaf() {
        let y = AppEntry::combo(
            "Y",
            vec![
                AppEntry {
                    name: "Y1".into(),
                    kind: EntryKind::Leaf {
                        path: None,
                        icon: None,
                    },
                },
                AppEntry {
                    name: "Y2".into(),
                    kind: EntryKind::Leaf {
                        path: None,
                        icon: None,
                    },
                },
            ],
        )
        .unwrap();
        let combo = combine(AppEntry::leaf("X", "x"), y);
        assert!(combo.is_combo());
        assert_eq!(combo.path(), None);
        assert_eq!(names(combo.children()), vec!["X", "Y1", "Y2"]);
        assert_eq!(combo.name, "X + Y1 +1 more");
    }

    #[test]
    fn dissolve_undoes_a_single_combine() {
        let a = leaf("A");
        let b = leaf("B");
        let restored = dissolve(combine(a.clone(), b.clone()));
        assert_eq!(restored, vec![a, b]);
    }

    #[test]
    fn dissolve_keeps_nested_combos_intact() {
        let inner = AppEntry::combo("inner", vec![leaf("B"), leaf("C")]).unwrap();
        let outer = AppEntry::combo("outer", vec![leaf("A"), inner.clone()]).unwrap();
        let restored = dissolve(outer);
        assert_eq!(restored.len(), 2);
        assert_eq!(restored[1], inner);
    }

    #[test]
    fn names_are_fixed_at_creation() {
        assert_eq!(combo_name(&[leaf("Calc"), leaf("Notepad")]), "Calc + Notepad");
        assert_eq!(
            combo_name(&[leaf("A"), leaf("B"), leaf("C"), leaf("D")]),
            "A + B +2 more"
        );
    }

    #[test]
    fn combo_icon_fills_quadrants() {
        let red = IconImage::solid(8, 8, [255, 0, 0, 255]);
        let blue = IconImage::solid(8, 8, [0, 0, 255, 255]);
        let out = compose_combo_icon(&[Some(&red), None, None, Some(&blue)], 48);
        assert_eq!((out.width, out.height), (48, 48));
        assert_eq!(out.pixel(5, 5), [255, 0, 0, 255]);
        assert_eq!(out.pixel(40, 5), [0, 0, 0, 0]);
        assert_eq!(out.pixel(30, 30), [0, 0, 255, 255]);
    }
}
