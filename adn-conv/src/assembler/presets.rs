//! Editor preset formats compiled from the descriptor

use super::descriptor::PresetDescriptor;
use crate::models::{Aesthetics, GrainKind};

/// Krita-style brush preset (XML body)
pub fn render_kpp(name: &str, descriptor: &PresetDescriptor, aesthetics: &Aesthetics) -> String {
    let grain_size = match aesthetics.grain.kind {
        GrainKind::Fine => 0.25,
        GrainKind::Coarse => 0.75,
    };

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<Preset name="{name}" paintopid="colorsmudge" embedded_resources="0">
 <param name="PresetId" type="string"><![CDATA[{preset_id}]]></param>
 <param name="Subject" type="string"><![CDATA[{subject}]]></param>
 <param name="Category" type="string"><![CDATA[{category}]]></param>
 <param name="ColorSaturation" type="float">{saturation:.2}</param>
 <param name="ColorContrast" type="float">{contrast:.2}</param>
 <param name="TextureGrainSize" type="float">{grain_size:.2}</param>
 <param name="TextureGrainStrength" type="float">{grain_strength:.2}</param>
</Preset>
"#,
        name = escape_xml(name),
        preset_id = descriptor.preset_id(),
        subject = descriptor.metadata.subject,
        category = descriptor.metadata.category,
        saturation = f64::from(aesthetics.saturation) / 100.0,
        contrast = f64::from(aesthetics.contrast) / 100.0,
        grain_size = grain_size,
        grain_strength = (f64::from(aesthetics.grain.intensity) / 25.0).min(1.0),
    )
}

/// Lightroom-style develop preset (XMP sidecar)
///
/// Aesthetic values are centered on 50, matching the editor's -50..+50 sliders.
pub fn render_xmp(name: &str, descriptor: &PresetDescriptor, aesthetics: &Aesthetics) -> String {
    format!(
        r##"<x:xmpmeta xmlns:x="adobe:ns:meta/" x:xmptk="adn-conv">
 <rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#">
  <rdf:Description rdf:about=""
    xmlns:crs="http://ns.adobe.com/camera-raw-settings/1.0/"
   crs:PresetType="Normal"
   crs:Version="15.0"
   crs:ProcessVersion="11.0"
   crs:Name="{name}"
   crs:UUID="{preset_id}"
   crs:Saturation="{saturation:+}"
   crs:Contrast2012="{contrast:+}"
   crs:GrainAmount="{grain_amount}"
   crs:GrainSize="{grain_size}"
   crs:GrainFrequency="50"/>
 </rdf:RDF>
</x:xmpmeta>
"##,
        name = escape_xml(name),
        preset_id = descriptor.preset_id(),
        saturation = i32::from(aesthetics.saturation) - 50,
        contrast = i32::from(aesthetics.contrast) - 50,
        grain_amount = aesthetics.grain.intensity.min(100),
        grain_size = match aesthetics.grain.kind {
            GrainKind::Fine => 15,
            GrainKind::Coarse => 45,
        },
    )
}

fn escape_xml(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
