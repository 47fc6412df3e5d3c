use crate::parser::NormalizedPoint;

const ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// A point with its position-derived label
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledPoint {
    pub index: usize,
    pub label: String,
    pub point: NormalizedPoint,
}

/// Display label for the hotspot at `index` in the left-to-right ordering.
///
/// `0..26` map to `A..Z`; from 26 on the label is
/// `ALPHABET[index / 26 - 1]` followed by `ALPHABET[index % 26]`
/// (26 -> `AA`, 51 -> `AZ`, 52 -> `BA`, 701 -> `ZZ`). Beyond `ZZ` the
/// prefix is labeled with the same rule, so 702 -> `AAA`.
pub fn label_for_index(index: usize) -> String {
    let mut label = Vec::new();
    let mut i = index;

    loop {
        label.push(ALPHABET[i % 26]);
        if i < 26 {
            break;
        }
        i = i / 26 - 1;
    }

    label.reverse();
    // ALPHABET is ASCII
    String::from_utf8(label).unwrap_or_default()
}

/// Sort points left to right by `x` and label them by position.
///
/// The sort is stable, so points sharing an `x` keep the order the
/// model reported them in.
pub fn order_and_label(mut points: Vec<NormalizedPoint>) -> Vec<LabeledPoint> {
    points.sort_by(|a, b| a.x.total_cmp(&b.x));

    points
        .into_iter()
        .enumerate()
        .map(|(index, point)| LabeledPoint {
            index,
            label: label_for_index(index),
            point,
        })
        .collect()
}
