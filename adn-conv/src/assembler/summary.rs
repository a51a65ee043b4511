//! Package README

use std::fmt::Write as _;

use super::descriptor::PresetDescriptor;
use crate::models::AnalysisResult;

pub fn render_readme(
    name_prefix: &str,
    result: &AnalysisResult,
    descriptor: &PresetDescriptor,
    artifact_paths: &[String],
) -> String {
    let classification = &result.classification;
    let aesthetics = &result.aesthetics;

    let mut out = String::new();
    let _ = writeln!(out, "# {} · {}", classification.primary_subject, classification.category);
    let _ = writeln!(out);
    let _ = writeln!(out, "Preset `{}` (integrity tag `{}`).", descriptor.preset_id(), result.integrity_tag);
    let _ = writeln!(out);
    let _ = writeln!(out, "## Source");
    let _ = writeln!(out);
    let _ = writeln!(out, "- Inputs: {}", result.input_count);
    let _ = writeln!(out, "- Symbols retained: {} of {} bytes", result.symbol_count, result.raw_length);
    let _ = writeln!(out, "- Entropy: {:.4} bits", result.entropy);
    for (symbol, frequency) in result.symbol_frequencies.iter() {
        let _ = writeln!(out, "- {}: {:.2}%", symbol, frequency * 100.0);
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "## Look");
    let _ = writeln!(out);
    let _ = writeln!(out, "| Parameter | Value |");
    let _ = writeln!(out, "|-----------|-------|");
    let _ = writeln!(out, "| Saturation | {} |", aesthetics.saturation);
    let _ = writeln!(out, "| Contrast | {} |", aesthetics.contrast);
    let _ = writeln!(
        out,
        "| Grain | {} ({}) |",
        aesthetics.grain.kind.as_str(),
        aesthetics.grain.intensity
    );
    let _ = writeln!(out);
    let _ = writeln!(out, "Conformity target: {}%", descriptor.metadata.conformity_target);
    let _ = writeln!(out);
    let _ = writeln!(out, "## Contents");
    let _ = writeln!(out);
    for path in artifact_paths {
        let _ = writeln!(out, "- `{}`", path);
    }
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "Load `luts/{prefix}_{tag}.cube` in any grading tool, or `luts/{prefix}_{tag}_log.cube` for log footage.",
        prefix = name_prefix,
        tag = result.integrity_tag
    );

    out
}
