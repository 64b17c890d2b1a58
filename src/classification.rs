//! Results of the ripeness and leaf-disease image models.

use serde::{Deserialize, Serialize};

use crate::language::Language;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RipenessClass {
    Unripe,
    Ripe,
    Overripe,
    Rotten,
    Unknown,
}

impl RipenessClass {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "unripe" => RipenessClass::Unripe,
            "ripe" => RipenessClass::Ripe,
            "overripe" => RipenessClass::Overripe,
            "rotten" => RipenessClass::Rotten,
            _ => RipenessClass::Unknown,
        }
    }

    /// Badge color for the result header.
    pub fn color(&self) -> &'static str {
        match self {
            RipenessClass::Unripe => "#77cc66",
            RipenessClass::Ripe => "#ffcc44",
            RipenessClass::Overripe => "#ee8833",
            RipenessClass::Rotten => "#cc4433",
            RipenessClass::Unknown => "#888888",
        }
    }

    pub fn shelf_life(&self, language: Language) -> &'static str {
        match (language, self) {
            (Language::English, RipenessClass::Unripe) => "4-6 days to become ripe.",
            (Language::English, RipenessClass::Ripe) => "3-4 days to become overripe.",
            (Language::English, RipenessClass::Overripe) => "Consume soon or use for baking.",
            (Language::English, RipenessClass::Rotten) => "Not edible.",
            (Language::English, RipenessClass::Unknown) => "Unknown shelf life.",
            (Language::Sinhala, RipenessClass::Unripe) => "පකුණු වීමට දින 4-6ක්.",
            (Language::Sinhala, RipenessClass::Ripe) => "අධික පකුණු වීමට දින 3-4ක්.",
            (Language::Sinhala, RipenessClass::Overripe) => {
                "ඉක්මනින් භාවිතා කරන්න හෝ පිසීමට යොදාගන්න."
            }
            (Language::Sinhala, RipenessClass::Rotten) => "භාවිතයට නුසුදුසුයි.",
            (Language::Sinhala, RipenessClass::Unknown) => "අදාල ආයු කාලය නොදනී.",
        }
    }
}

/// Raw response of the ripeness classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RipenessResult {
    pub predicted_class: String,
    /// 0.0-1.0
    pub confidence: f64,
}

impl RipenessResult {
    pub fn class(&self) -> RipenessClass {
        RipenessClass::parse(&self.predicted_class)
    }

    /// Class name with its first letter capitalized.
    pub fn display_class(&self) -> String {
        let mut chars = self.predicted_class.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    pub fn confidence_percent(&self) -> String {
        format!("{:.2}%", self.confidence * 100.0)
    }

    pub fn report(&self, language: Language) -> RipenessReport {
        let class = self.class();
        RipenessReport {
            class,
            label: self.display_class(),
            confidence: self.confidence_percent(),
            color: class.color(),
            shelf_life: class.shelf_life(language),
        }
    }
}

/// What the ripeness screen renders for one result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RipenessReport {
    pub class: RipenessClass,
    pub label: String,
    pub confidence: String,
    pub color: &'static str,
    pub shelf_life: &'static str,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Treatment {
    #[serde(default)]
    pub english: Vec<String>,
    #[serde(default)]
    pub sinhala: Vec<String>,
}

/// Response of the leaf-disease model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseasePrediction {
    pub class: String,
    pub confidence: f64,
    /// Base64 heat-map overlay, when the server renders one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gradcam_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treatment: Option<Treatment>,
}

impl DiseasePrediction {
    pub fn treatment_for(&self, language: Language) -> &[String] {
        match (&self.treatment, language) {
            (Some(t), Language::English) => t.english.as_slice(),
            (Some(t), Language::Sinhala) => t.sinhala.as_slice(),
            (None, _) => &[],
        }
    }

    /// Treatment steps as one sentence run for text-to-speech. `None` when
    /// there is nothing to read.
    pub fn spoken_treatment(&self, language: Language) -> Option<String> {
        let steps = self.treatment_for(language);
        if steps.is_empty() {
            None
        } else {
            Some(steps.join(". "))
        }
    }

    pub fn report(&self, language: Language) -> DiseaseReport {
        DiseaseReport {
            class: self.class.clone(),
            confidence: format!("{:.2}%", self.confidence * 100.0),
            gradcam_image: self.gradcam_image.clone(),
            steps: self.treatment_for(language).to_vec(),
            spoken: self.spoken_treatment(language),
            speech_tag: language.speech_tag(),
        }
    }
}

/// What the disease screen renders and reads aloud for one prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiseaseReport {
    pub class: String,
    pub confidence: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradcam_image: Option<String>,
    pub steps: Vec<String>,
    pub spoken: Option<String>,
    pub speech_tag: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ripeness_class_is_case_insensitive() {
        assert_eq!(RipenessClass::parse("Overripe"), RipenessClass::Overripe);
        assert_eq!(RipenessClass::parse("green"), RipenessClass::Unknown);
        assert_eq!(RipenessClass::Ripe.color(), "#ffcc44");
        assert_eq!(
            RipenessClass::Unripe.shelf_life(Language::English),
            "4-6 days to become ripe."
        );
    }

    #[test]
    fn formats_ripeness_result() {
        let result = RipenessResult {
            predicted_class: "overripe".into(),
            confidence: 0.8123,
        };
        assert_eq!(result.display_class(), "Overripe");
        assert_eq!(result.confidence_percent(), "81.23%");
        assert_eq!(result.class(), RipenessClass::Overripe);
    }

    #[test]
    fn disease_treatment_by_language() {
        let prediction: DiseasePrediction = serde_json::from_str(
            r#"{
                "class": "Sigatoka",
                "confidence": 0.91,
                "treatment": {"english": ["Remove infected leaves", "Apply fungicide"]}
            }"#,
        )
        .unwrap();
        assert_eq!(
            prediction.spoken_treatment(Language::English).as_deref(),
            Some("Remove infected leaves. Apply fungicide")
        );
        assert_eq!(prediction.spoken_treatment(Language::Sinhala), None);
        assert!(prediction.gradcam_image.is_none());
    }

    #[test]
    fn reports_follow_language() {
        let result = RipenessResult {
            predicted_class: "ripe".into(),
            confidence: 0.975,
        };
        let report = result.report(Language::Sinhala);
        assert_eq!(report.label, "Ripe");
        assert_eq!(report.confidence, "97.50%");
        assert_eq!(report.color, "#ffcc44");
        assert_eq!(report.shelf_life, "අධික පකුණු වීමට දින 3-4ක්.");

        let prediction = DiseasePrediction {
            class: "Panama wilt".into(),
            confidence: 0.5,
            gradcam_image: None,
            treatment: Some(Treatment {
                english: vec!["Uproot affected plants".into()],
                sinhala: vec!["ආසාදිත පැළ ඉවත් කරන්න".into()],
            }),
        };
        let report = prediction.report(Language::Sinhala);
        assert_eq!(report.confidence, "50.00%");
        assert_eq!(report.steps, vec!["ආසාදිත පැළ ඉවත් කරන්න".to_string()]);
        assert_eq!(report.speech_tag, "si-LK");
    }
}
