//! Plain-text map rendering for terminals

use crate::overworld::OverWorld;

/// Glyph for an unseen tile
pub const FOG: char = '?';

/// Terrain glyph by height, deep water to peaks
fn height_glyph(height: i8) -> char {
    match height {
        i8::MIN..=-1 => '~',
        0 => '.',
        1 => ',',
        2 => ':',
        3 => ';',
        4 | 5 => '^',
        _ => 'A',
    }
}

/// Render the map as staggered rows: column `i`, row `2j + i`.
///
/// Occupied tiles show a letter per species (`a` for id 1); `reveal_all`
/// ignores fog of war.
pub fn render_ascii(world: &OverWorld, reveal_all: bool) -> String {
    let tiles = world.tiles();
    if tiles.is_empty() {
        return String::new();
    }

    let (mut min_i, mut max_i) = (i32::MAX, i32::MIN);
    let (mut min_r, mut max_r) = (i32::MAX, i32::MIN);
    for key in tiles.keys() {
        let r = 2 * key.j + key.i;
        min_i = min_i.min(key.i);
        max_i = max_i.max(key.i);
        min_r = min_r.min(r);
        max_r = max_r.max(r);
    }

    let mut out = String::new();
    for r in min_r..=max_r {
        let mut line = String::new();
        for i in min_i..=max_i {
            let offset = r - i;
            let glyph = if offset.rem_euclid(2) != 0 {
                ' '
            } else {
                match tiles.get(i, offset.div_euclid(2)) {
                    None => ' ',
                    Some(tile) if !reveal_all && !tile.info.visible => FOG,
                    Some(tile) => match tile.info.occupant() {
                        Some(species) => species_glyph(species.0),
                        None => height_glyph(tile.info.height),
                    },
                }
            };
            line.push(glyph);
        }
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

fn species_glyph(id: u32) -> char {
    let offset = (id.saturating_sub(1) % 26) as u8;
    (b'a' + offset) as char
}
