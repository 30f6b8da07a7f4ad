/// Stage loader.
///
/// ## Sources (priority order):
///   1. `stages_dir` (individual `.txt` files, sorted by file name)
///   2. Built-in embedded stages
///
/// ## Stage format (`.txt`):
///   Line 1: `# Stage Name` (optional)
///   Lines: map rows, one character per 8×8 tile, 16 rows tall
///
/// ## Tile legend:
///   '#' '%' = Wall               '=' = Floor (one-way, from above)
///   '1' = Walker spawn           '2' = Ledge walker spawn
///   '3' = Shooter spawn          'G' = Goal
///   '?' = Broken marker (ignored) ' ' '.' = Empty
///
/// The player always starts at the top-left corner and drops in.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::GameConfig;
use crate::domain::tile::TileMap;

/// One stage as text rows. Parsed into a `TileMap` on load.
#[derive(Clone, Debug)]
pub struct StageDef {
    pub name: String,
    pub rows: Vec<String>,
}

impl StageDef {
    pub fn to_map(&self) -> TileMap {
        TileMap::from_rows(&self.rows)
    }
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

/// The stage list for this session: the stages directory if it holds any
/// readable stage, otherwise the embedded set.
pub fn stage_list(config: &GameConfig) -> Vec<StageDef> {
    let dir = &config.stages_dir;
    if dir.is_dir() {
        match load_from_directory(dir) {
            Ok(stages) if !stages.is_empty() => {
                info!(count = stages.len(), dir = %dir.display(), "stages loaded");
                return stages;
            }
            Ok(_) => info!(dir = %dir.display(), "no stage files, using built-in stages"),
            Err(e) => warn!(error = %format!("{e:#}"), "stage directory unreadable, using built-in stages"),
        }
    }
    embedded_stages()
}

/// Parse every `.txt` stage in `dir`, ordered by file name.
/// Files that fail to read are skipped with a warning.
pub fn load_from_directory(dir: &Path) -> Result<Vec<StageDef>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("reading stage directory {}", dir.display()))?;

    let mut found = vec![];
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.extension().map_or(false, |e| e == "txt") { continue; }
        match read_stage_file(&path) {
            Ok(Some(def)) => {
                let filename = path.file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_string();
                found.push((filename, def));
            }
            Ok(None) => warn!(path = %path.display(), "stage file has no map rows"),
            Err(e) => warn!(error = %format!("{e:#}"), "skipping stage file"),
        }
    }

    found.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(found.into_iter().map(|(_, def)| def).collect())
}

fn read_stage_file(path: &Path) -> Result<Option<StageDef>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    Ok(parse_stage(&content))
}

// ══════════════════════════════════════════════════════════════
// Single-stage parsing
// ══════════════════════════════════════════════════════════════

/// Parse a single stage from text content.
pub fn parse_stage(content: &str) -> Option<StageDef> {
    let mut name = String::new();
    let mut rows = vec![];

    for line in content.lines() {
        if line.starts_with('#') && name.is_empty() && rows.is_empty() && is_name_line(line) {
            name = line[1..].trim().to_string();
        } else {
            rows.push(line.trim_end_matches('\r').to_string());
        }
    }

    while rows.last().map_or(false, |r| r.trim().is_empty()) {
        rows.pop();
    }

    if rows.is_empty() {
        return None;
    }

    let max_width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0);
    for row in &mut rows {
        let len = row.chars().count();
        if len < max_width {
            row.extend(std::iter::repeat(' ').take(max_width - len));
        }
    }

    if name.is_empty() {
        name = "Untitled".to_string();
    }

    Some(StageDef { name, rows })
}

/// Distinguish `# Stage Name` from a map row starting with a wall.
/// A name line has a letter after the `#` other than the goal glyph.
fn is_name_line(line: &str) -> bool {
    line[1..].chars().any(|c| c.is_alphabetic() && c != 'G')
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback stages
// ══════════════════════════════════════════════════════════════

pub fn embedded_stages() -> Vec<StageDef> {
    vec![
        make_embedded("1-1 Meadow Run", &[
            "                                                                ",
            "                                                                ",
            "                                                                ",
            "                                                                ",
            "                                                                ",
            "                                                                ",
            "                                                                ",
            "                                                                ",
            "                                                                ",
            "                                 2                              ",
            "                              =======                           ",
            "          ======                                                ",
            "                                             =====              ",
            "                                                    ##          ",
            "                  1         1                   1   ##      G   ",
            "######################   ################  #####################",
        ]),
        make_embedded("1-2 Sniper Ridge", &[
            "                                                                        ",
            "                                                                        ",
            "                                                                        ",
            "                                                                        ",
            "                                                                        ",
            "                                                                        ",
            "                                                                        ",
            "                                                                        ",
            "                           2                                            ",
            "                        ========                             3          ",
            "                    33                                    ======        ",
            "              ======                 2                                  ",
            "        =====                    ========                               ",
            "                                               ###                      ",
            "                          1                 3  ###  1             1  G  ",
            "##############    ################     ################  ###############",
        ]),
        make_embedded("1-3 Broken Bridge", &[
            "                                                                                ",
            "                                                                                ",
            "                                                                                ",
            "                                                                                ",
            "                                                                                ",
            "                                                                                ",
            "                                                                                ",
            "                                                                                ",
            "                                  2                                             ",
            "               2               ======                            3              ",
            "            =====                          3                   %%%%%            ",
            "                      3                  =====          2                       ",
            "      ====         %%%%%                  ?          ======                     ",
            "                          ====                    %                             ",
            "                                    1  1          %         1         1     G   ",
            "##########    ###########      ###############    ############   ###############",
        ]),
    ]
}

fn make_embedded(name: &str, map: &[&str]) -> StageDef {
    StageDef {
        name: name.to_string(),
        rows: map.iter().map(|s| s.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::tile::{TileGrid, TileKind};

    // ── parse_stage ──

    #[test]
    fn name_line_and_rows() {
        let def = parse_stage("# Test Stage\n  G\n###\n").unwrap();
        assert_eq!(def.name, "Test Stage");
        assert_eq!(def.rows, vec!["  G", "###"]);
    }

    #[test]
    fn wall_row_is_not_a_name() {
        let def = parse_stage("####\n #G \n").unwrap();
        assert_eq!(def.name, "Untitled");
        assert_eq!(def.rows.len(), 2);
    }

    #[test]
    fn short_rows_padded_and_trailing_blank_lines_dropped() {
        let def = parse_stage("# Pad\n#\n###\n\n   \n").unwrap();
        assert_eq!(def.rows, vec!["#  ", "###"]);
    }

    #[test]
    fn empty_content_is_none() {
        assert!(parse_stage("").is_none());
        assert!(parse_stage("# Only A Name\n\n").is_none());
    }

    #[test]
    fn crlf_rows_are_clean() {
        let def = parse_stage("# Win\r\n=1=\r\n").unwrap();
        assert_eq!(def.rows, vec!["=1="]);
        assert_eq!(def.to_map().tile_at(1, 0), TileKind::Spawn(1));
    }

    // ── directory loading ──

    #[test]
    fn directory_sorted_by_file_name() {
        let dir = std::env::temp_dir().join(format!("tilejumper-stages-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("b.txt"), "# Second\n###\n").unwrap();
        std::fs::write(dir.join("a.txt"), "# First\n###\n").unwrap();
        std::fs::write(dir.join("notes.md"), "# Not A Stage\n###\n").unwrap();
        std::fs::write(dir.join("c.txt"), "\n\n").unwrap();

        let stages = load_from_directory(&dir).unwrap();
        let names: Vec<&str> = stages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["First", "Second"]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_directory_is_an_error() {
        let dir = std::env::temp_dir().join("tilejumper-no-such-dir-for-tests");
        assert!(load_from_directory(&dir).is_err());
    }

    // ── embedded ──

    #[test]
    fn embedded_stages_are_well_formed() {
        let stages = embedded_stages();
        assert_eq!(stages.len(), 3);
        for def in &stages {
            assert_eq!(def.rows.len(), 16, "{}", def.name);
            let width = def.rows[0].len();
            assert!(def.rows.iter().all(|r| r.len() == width), "{} is ragged", def.name);

            let map = def.to_map();
            let goals = (0..map.width as i32)
                .flat_map(|c| (0..16).map(move |r| (c, r)))
                .filter(|&(c, r)| map.tile_at(c, r) == TileKind::GoalMarker)
                .count();
            assert_eq!(goals, 1, "{}", def.name);
            // the drop-in column has ground under it
            assert!((0..16).any(|r| map.tile_at(0, r).is_wall()), "{}", def.name);
        }
    }
}
