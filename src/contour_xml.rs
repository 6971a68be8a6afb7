use anyhow::{anyhow, Context, Result};
use glam::Vec3;
use roxmltree::{Document, Node};

use crate::geometry::Contour;

/// Polygon outline read from a world file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NamedContour {
    pub name: Option<String>,
    pub contour: Contour,
}

impl NamedContour {
    /// Name for reports; unnamed polygons are labelled by position.
    pub fn label(&self, position: usize) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("polygon #{position}"))
    }
}

/// Parses every `<polygon>` (or `<contour>`) element and its `<v x y z>`
/// children, in document order.
///
/// ```xml
/// <world>
///   <polygon name="floor">
///     <v x="0" y="0" z="0"/>
///     <v x="4" y="0" z="0"/>
///     <v x="4" y="0" z="4"/>
///   </polygon>
/// </world>
/// ```
pub fn load_contours_from_str(xml: &str) -> Result<Vec<NamedContour>> {
    let document = Document::parse(xml).context("invalid contour XML")?;
    let mut contours = Vec::new();

    for node in document
        .descendants()
        .filter(|n| n.has_tag_name("polygon") || n.has_tag_name("contour"))
    {
        let mut polygon = NamedContour {
            name: node.attribute("name").map(str::to_string),
            contour: Contour::new(),
        };
        for (index, vertex) in node
            .children()
            .filter(|n| n.has_tag_name("v"))
            .enumerate()
        {
            let point = parse_vertex(&vertex).with_context(|| {
                format!("invalid vertex {index} in {}", polygon.label(contours.len()))
            })?;
            polygon.contour.push(point);
        }
        contours.push(polygon);
    }

    if contours.is_empty() {
        return Err(anyhow!("contour XML does not define any polygons"));
    }
    Ok(contours)
}

fn parse_vertex(node: &Node<'_, '_>) -> Result<Vec3> {
    Ok(Vec3::new(
        required_f32(node, "x")?,
        required_f32(node, "y")?,
        required_f32(node, "z")?,
    ))
}

fn required_f32(node: &Node<'_, '_>, attribute: &str) -> Result<f32> {
    let value = node
        .attribute(attribute)
        .ok_or_else(|| anyhow!("'{attribute}' attribute is missing"))?;
    value
        .trim()
        .parse::<f32>()
        .map_err(|err| anyhow!("failed to parse '{attribute}' value {value:?}: {err}"))
}
