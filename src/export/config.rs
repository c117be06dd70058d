//! Chart styling, read from the `chart` section of config.json.

use serde::{Deserialize, Serialize};

use crate::model::{Stat, StatMap};

/// Chart configuration with all customizable values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Font sizes
    pub font: FontConfig,
    /// Colors (RGB values)
    pub colors: ColorConfig,
    /// Layout dimensions
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FontConfig {
    /// Title font size
    pub title_size: u32,
    /// Panel caption font size
    pub caption_size: u32,
    /// Legend font size
    pub legend_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    /// Line color per stat [R, G, B]
    pub speed: [u8; 3],
    pub stamina: [u8; 3],
    pub power: [u8; 3],
    pub guts: [u8; 3],
    pub wit: [u8; 3],
    /// Panel background [R, G, B]
    pub background: [u8; 3],
    /// Grid line color [R, G, B]
    pub grid_color: [u8; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Chart image width
    pub chart_width: u32,
    /// Chart image height (both panels)
    pub chart_height: u32,
    /// Title area height
    pub title_height: u32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            title_size: 28,
            caption_size: 18,
            legend_size: 14,
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            speed: [52, 152, 219],   // #3498DB
            stamina: [231, 76, 60],  // #E74C3C
            power: [243, 156, 18],   // #F39C12
            guts: [155, 89, 182],    // #9B59B6
            wit: [39, 174, 96],      // #27AE60
            background: [245, 245, 245],
            grid_color: [220, 220, 220],
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            chart_width: 1000,
            chart_height: 900,
            title_height: 50,
        }
    }
}

impl ColorConfig {
    pub fn stat_colors(&self) -> StatMap<[u8; 3]> {
        StatMap::from_fn(|stat| match stat {
            Stat::Speed => self.speed,
            Stat::Stamina => self.stamina,
            Stat::Power => self.power,
            Stat::Guts => self.guts,
            Stat::Wit => self.wit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_override() {
        let config: ChartConfig =
            serde_json::from_str(r#"{"colors": {"wit": [1, 2, 3]}, "layout": {"chart_width": 640}}"#)
                .unwrap();
        assert_eq!(config.colors.stat_colors()[Stat::Wit], [1, 2, 3]);
        assert_eq!(config.colors.speed, [52, 152, 219]);
        assert_eq!(config.layout.chart_width, 640);
        assert_eq!(config.layout.chart_height, 900);
    }
}
