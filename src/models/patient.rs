use serde::{Serialize, Deserialize};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub patient_id: String,
    pub name: String,
    pub age: String,
    pub sex: Sex,
    pub blood_type: BloodType,
    pub diagnosis: String,
    pub attending_doctor: String,
}

impl PatientRecord {
    /// Record shown before anyone has edited the form.
    pub fn admitted() -> Self {
        Self {
            patient_id: "P-2024-001".to_string(),
            name: "Tn. Soleh".to_string(),
            age: "45 tahun".to_string(),
            sex: Sex::Male,
            blood_type: BloodType::OPositive,
            diagnosis: "Stroke Hemoragik".to_string(),
            attending_doctor: "dr. Agatha".to_string(),
        }
    }

    /// Record left behind by a reset.
    pub fn blank() -> Self {
        Self {
            patient_id: String::new(),
            name: String::new(),
            age: String::new(),
            sex: Sex::Male,
            blood_type: BloodType::OPositive,
            diagnosis: String::new(),
            attending_doctor: String::new(),
        }
    }

    /// Label/value pairs in sidebar order.
    pub fn fields(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Patient ID", self.patient_id.clone()),
            ("Name", self.name.clone()),
            ("Age", self.age.clone()),
            ("Sex", self.sex.to_string()),
            ("Blood Type", self.blood_type.to_string()),
            ("Diagnosis", self.diagnosis.clone()),
            ("Attending Doctor", self.attending_doctor.clone()),
        ]
    }
}

impl Default for PatientRecord {
    fn default() -> Self {
        Self::admitted()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sex {
    Male,
    Female,
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => f.write_str("Male"),
            Sex::Female => f.write_str("Female"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BloodType {
    #[serde(rename = "A+")]
    APositive,
    #[serde(rename = "A-")]
    ANegative,
    #[serde(rename = "B+")]
    BPositive,
    #[serde(rename = "B-")]
    BNegative,
    #[serde(rename = "O+")]
    OPositive,
    #[serde(rename = "O-")]
    ONegative,
    #[serde(rename = "AB+")]
    AbPositive,
    #[serde(rename = "AB-")]
    AbNegative,
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BloodType::APositive => "A+",
            BloodType::ANegative => "A-",
            BloodType::BPositive => "B+",
            BloodType::BNegative => "B-",
            BloodType::OPositive => "O+",
            BloodType::ONegative => "O-",
            BloodType::AbPositive => "AB+",
            BloodType::AbNegative => "AB-",
        };
        f.write_str(s)
    }
}
