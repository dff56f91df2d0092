//! 增强参数。
//!
//! 由展示层提供，核心只做范围校验与表单序列化。

use serde::{Deserialize, Serialize};

use super::ValidationError;

pub const UPSCALE_RANGE: std::ops::RangeInclusive<u8> = 1..=4;
pub const FIDELITY_RANGE: std::ops::RangeInclusive<f32> = 0.0..=1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnhancementOptions {
    pub face_align: bool,
    pub background_enhance: bool,
    pub face_upsample: bool,
    /// 放大倍数（1~4）。
    pub upscale: u8,
    /// 保真度权重（0.0~1.0），越大越接近原图。
    pub codeformer_fidelity: f32,
}

impl Default for EnhancementOptions {
    fn default() -> Self {
        Self {
            face_align: true,
            background_enhance: true,
            face_upsample: true,
            upscale: 2,
            codeformer_fidelity: 0.5,
        }
    }
}

impl EnhancementOptions {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !UPSCALE_RANGE.contains(&self.upscale) {
            return Err(ValidationError::InvalidOption(format!(
                "upscale 必须在 {}~{} 之间（当前：{}）",
                UPSCALE_RANGE.start(),
                UPSCALE_RANGE.end(),
                self.upscale
            )));
        }
        if !FIDELITY_RANGE.contains(&self.codeformer_fidelity) {
            return Err(ValidationError::InvalidOption(format!(
                "codeformer_fidelity 必须在 0.0~1.0 之间（当前：{}）",
                self.codeformer_fidelity
            )));
        }
        Ok(())
    }

    /// 按接口字段名输出文本表单项，顺序与请求体一致。
    pub fn form_fields(&self) -> [(&'static str, String); 5] {
        [
            ("face_align", self.face_align.to_string()),
            ("background_enhance", self.background_enhance.to_string()),
            ("face_upsample", self.face_upsample.to_string()),
            ("upscale", self.upscale.to_string()),
            ("codeformer_fidelity", self.codeformer_fidelity.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_serialize_as_literal_text() {
        let fields = EnhancementOptions::default().form_fields();

        assert_eq!(
            fields,
            [
                ("face_align", "true".to_string()),
                ("background_enhance", "true".to_string()),
                ("face_upsample", "true".to_string()),
                ("upscale", "2".to_string()),
                ("codeformer_fidelity", "0.5".to_string()),
            ]
        );
    }

    #[test]
    fn disabled_flags_serialize_as_false() {
        let options = EnhancementOptions {
            face_align: false,
            background_enhance: false,
            face_upsample: true,
            upscale: 4,
            codeformer_fidelity: 0.7,
        };

        let fields = options.form_fields();
        assert_eq!(fields[0].1, "false");
        assert_eq!(fields[1].1, "false");
        assert_eq!(fields[3].1, "4");
        assert_eq!(fields[4].1, "0.7");
    }

    #[test]
    fn validate_rejects_out_of_range_values() {
        let mut options = EnhancementOptions::default();
        options.upscale = 0;
        assert!(matches!(options.validate(), Err(ValidationError::InvalidOption(_))));

        let mut options = EnhancementOptions::default();
        options.upscale = 5;
        assert!(matches!(options.validate(), Err(ValidationError::InvalidOption(_))));

        let mut options = EnhancementOptions::default();
        options.codeformer_fidelity = 1.5;
        assert!(matches!(options.validate(), Err(ValidationError::InvalidOption(_))));

        let mut options = EnhancementOptions::default();
        options.codeformer_fidelity = f32::NAN;
        assert!(matches!(options.validate(), Err(ValidationError::InvalidOption(_))));
    }

    #[test]
    fn boundary_values_are_accepted() {
        let options = EnhancementOptions {
            upscale: 1,
            codeformer_fidelity: 0.0,
            ..EnhancementOptions::default()
        };
        assert!(options.validate().is_ok());

        let options = EnhancementOptions {
            upscale: 4,
            codeformer_fidelity: 1.0,
            ..EnhancementOptions::default()
        };
        assert!(options.validate().is_ok());
    }
}
