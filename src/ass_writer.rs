/*!
 * ASS (Advanced SubStation Alpha) writer for bilingual merged tracks.
 *
 * Top cues use a top-center style and bottom cues a bottom-center style, so
 * both languages can be on screen at the same time without colliding.
 */

use std::fmt::Write as _;
use std::path::Path;

use log::debug;

use crate::app_config::StyleConfig;
use crate::cue::{MergedTrack, Role};
use crate::errors::SubtitleError;
use crate::file_utils::FileManager;

// @const: Numpad alignments
const ALIGN_TOP_CENTER: u8 = 8;
const ALIGN_BOTTOM_CENTER: u8 = 2;

/// One `[V4+ Styles]` entry
#[derive(Debug, Clone, PartialEq)]
pub struct AssStyle {
    pub name: String,
    pub font_name: String,
    pub font_size: u32,
    /// Text colour, `&HAABBGGRR`
    pub primary_colour: String,
    pub outline_colour: String,
    pub back_colour: String,
    pub outline: u32,
    pub shadow: u32,
    /// Numpad layout: 1-3 bottom, 4-6 middle, 7-9 top
    pub alignment: u8,
    pub margin_l: u32,
    pub margin_r: u32,
    pub margin_v: u32,
}

impl AssStyle {
    /// Style for one role of a merged track
    pub fn for_role(role: Role, config: &StyleConfig) -> Self {
        let (primary_colour, alignment) = match role {
            Role::Top => (config.top_colour.clone(), ALIGN_TOP_CENTER),
            Role::Bottom => (config.bottom_colour.clone(), ALIGN_BOTTOM_CENTER),
        };

        Self {
            name: role.style_name().to_string(),
            font_name: config.font_name.clone(),
            font_size: config.font_size,
            primary_colour,
            outline_colour: config.outline_colour.clone(),
            back_colour: config.back_colour.clone(),
            outline: config.outline,
            shadow: config.shadow,
            alignment,
            margin_l: config.margin_h,
            margin_r: config.margin_h,
            margin_v: config.margin_v,
        }
    }

    fn to_style_line(&self) -> String {
        format!(
            "Style: {name},{font},{size},{primary},{primary},{outline},{back},0,0,0,0,100,100,0,0,1,{outline_w},{shadow},{align},{ml},{mr},{mv},1",
            name = self.name,
            font = self.font_name,
            size = self.font_size,
            primary = self.primary_colour,
            outline = self.outline_colour,
            back = self.back_colour,
            outline_w = self.outline,
            shadow = self.shadow,
            align = self.alignment,
            ml = self.margin_l,
            mr = self.margin_r,
            mv = self.margin_v,
        )
    }
}

/// Serializes merged tracks as ASS documents
#[derive(Debug, Clone, Default)]
pub struct AssWriter {
    style: StyleConfig,
}

impl AssWriter {
    pub fn new(style: StyleConfig) -> Self {
        Self { style }
    }

    /// Render the complete document
    pub fn render(&self, track: &MergedTrack) -> String {
        let mut output = String::new();

        let _ = writeln!(output, "[Script Info]");
        let _ = writeln!(output, "; Generated by extractsubs");
        let _ = writeln!(output, "ScriptType: v4.00+");
        let _ = writeln!(output, "PlayResX: {}", self.style.play_res_x);
        let _ = writeln!(output, "PlayResY: {}", self.style.play_res_y);
        let _ = writeln!(output, "WrapStyle: 0");
        let _ = writeln!(output, "ScaledBorderAndShadow: yes");
        let _ = writeln!(output);

        let _ = writeln!(output, "[V4+ Styles]");
        let _ = writeln!(
            output,
            "Format: Name, Fontname, Fontsize, PrimaryColour, SecondaryColour, OutlineColour, BackColour, Bold, Italic, Underline, StrikeOut, ScaleX, ScaleY, Spacing, Angle, BorderStyle, Outline, Shadow, Alignment, MarginL, MarginR, MarginV, Encoding"
        );
        for role in [Role::Top, Role::Bottom] {
            let _ = writeln!(output, "{}", AssStyle::for_role(role, &self.style).to_style_line());
        }
        let _ = writeln!(output);

        let _ = writeln!(output, "[Events]");
        let _ = writeln!(
            output,
            "Format: Layer, Start, End, Style, Name, MarginL, MarginR, MarginV, Effect, Text"
        );

        for merged in track {
            let _ = writeln!(
                output,
                "Dialogue: 0,{start},{end},{style},,0,0,0,,{text}",
                start = merged.cue.start.to_ass_string(),
                end = merged.cue.end.to_ass_string(),
                style = merged.role.style_name(),
                text = event_text(&merged.cue.lines),
            );
        }

        output
    }

    /// Write the document to `path`.
    ///
    /// Either the complete document lands at `path` or nothing does.
    pub fn write<P: AsRef<Path>>(&self, track: &MergedTrack, path: P) -> Result<(), SubtitleError> {
        let path = path.as_ref();
        let content = self.render(track);

        FileManager::write_atomic(path, &content).map_err(|e| SubtitleError::io(path, e))?;

        debug!("Wrote {} dialogue events to {}", track.len(), path.display());
        Ok(())
    }
}

/// Join display lines with the ASS hard line break
fn event_text(lines: &[String]) -> String {
    lines
        .iter()
        .map(|line| line.replace('\n', "\\N"))
        .collect::<Vec<_>>()
        .join("\\N")
}
