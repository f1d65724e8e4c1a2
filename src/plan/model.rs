//! Birth plan document model.
//!
//! A fixed tree: thirteen sections of text fields plus free-text notes.
//! Every field is always present; synthesis fills gaps with placeholders.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Defines a section struct whose fields serialize under the schema keys,
/// plus a by-key accessor used for rendering.
macro_rules! plan_section {
    ($(#[$meta:meta])* $name:ident { $($field:ident => $key:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            $(
                #[serde(rename = $key)]
                pub $field: String,
            )+
        }

        impl $name {
            /// Value of the field serialized as `key`.
            pub fn get(&self, key: &str) -> Option<&str> {
                match key {
                    $($key => Some(self.$field.as_str()),)+
                    _ => None,
                }
            }
        }
    };
}

plan_section!(
    /// Who the parents are and where the birth happens.
    PersonalInfo {
        parent_names => "parentNames",
        due_date => "dueDate",
        provider => "provider",
        hospital => "hospital",
        emergency_contacts => "emergencyContacts",
        medical_history => "medicalHistory",
        blood_type => "bloodType",
    }
);

plan_section!(
    SupportTeam {
        support_people => "supportPeople",
        doula => "doula",
        communication_preferences => "communicationPreferences",
        visitors => "visitors",
        photography => "photography",
        student_observers => "studentObservers",
    }
);

plan_section!(
    LaborPreferences {
        environment => "environment",
        atmosphere => "atmosphere",
        movement => "movement",
        labor_positions => "laborPositions",
        hydrotherapy => "hydrotherapy",
        eating_drinking => "eatingDrinking",
        clothing => "clothing",
        encouragement => "encouragement",
    }
);

plan_section!(
    PainManagement {
        preferred_methods => "preferredMethods",
        natural_comfort => "naturalComfort",
        avoid_methods => "avoidMethods",
        epidural_timing => "epiduralTiming",
        backup_plan => "backupPlan",
    }
);

plan_section!(
    MedicalInterventions {
        monitoring => "monitoring",
        cervical_checks => "cervicalChecks",
        iv_fluids => "ivFluids",
        induction => "induction",
        augmentation => "augmentation",
        amniotomy => "amniotomy",
        internal_monitoring => "internalMonitoring",
        catheter => "catheter",
    }
);

plan_section!(
    DeliveryPreferences {
        positions => "positions",
        pushing => "pushing",
        perineal_care => "perinealCare",
        assisted_delivery => "assistedDelivery",
        who_catches_baby => "whoCatchesBaby",
        who_announces_sex => "whoAnnouncesSex",
        mirror => "mirror",
    }
);

plan_section!(
    CordAndPlacenta {
        delayed_cord_clamping => "delayedCordClamping",
        cord_cutting => "cordCutting",
        cord_blood_banking => "cordBloodBanking",
        placenta => "placenta",
        lotus => "lotus",
    }
);

plan_section!(
    /// The first hour after birth.
    ImmediatePostpartum {
        skin_to_skin => "skinToSkin",
        first_feed => "firstFeed",
        baby_exams => "babyExams",
        weight => "weight",
        family_time => "familyTime",
    }
);

plan_section!(
    NewbornProcedures {
        vitamin_k => "vitaminK",
        eye_ointment => "eyeOintment",
        hepatitis_b => "hepatitisB",
        newborn_screening => "newbornScreening",
        hearing => "hearing",
        first_bath => "firstBath",
        circumcision => "circumcision",
        vaccinations => "vaccinations",
    }
);

plan_section!(
    /// Cesarean, NICU and decision-making preferences.
    EmergencyPreferences {
        cesarean_preferences => "cesareanPreferences",
        cesarean_details => "cesareanDetails",
        nicu_preferences => "nicuPreferences",
        unexpected_situations => "unexpectedSituations",
        decision_maker => "decisionMaker",
    }
);

plan_section!(
    PostpartumCare {
        rooming => "rooming",
        mother_care => "motherCare",
        circumcision_timing => "circumcisionTiming",
        jaundice_protocol => "jaundiceProtocol",
    }
);

plan_section!(
    FeedingPlan {
        method => "method",
        first_feed => "firstFeed",
        lactation_support => "lactationSupport",
        pacifiers => "pacifiers",
        bottles => "bottles",
        supplements => "supplements",
        donor_milk => "donorMilk",
    }
);

plan_section!(
    CulturalReligious {
        practices => "practices",
        dietary => "dietary",
        rituals => "rituals",
        naming => "naming",
        placenta => "placenta",
    }
);

/// A complete birth plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BirthPlan {
    pub personal_info: PersonalInfo,
    pub support_team: SupportTeam,
    pub labor_preferences: LaborPreferences,
    pub pain_management: PainManagement,
    pub medical_interventions: MedicalInterventions,
    pub delivery_preferences: DeliveryPreferences,
    pub cord_and_placenta: CordAndPlacenta,
    pub immediate_postpartum: ImmediatePostpartum,
    pub newborn_procedures: NewbornProcedures,
    pub emergency_preferences: EmergencyPreferences,
    pub postpartum_care: PostpartumCare,
    pub feeding_plan: FeedingPlan,
    pub cultural_religious: CulturalReligious,
    pub additional_notes: String,
}

impl BirthPlan {
    /// Value of `field` in `section`, both given by schema key.
    pub fn get(&self, section: &str, field: &str) -> Option<&str> {
        match section {
            "personalInfo" => self.personal_info.get(field),
            "supportTeam" => self.support_team.get(field),
            "laborPreferences" => self.labor_preferences.get(field),
            "painManagement" => self.pain_management.get(field),
            "medicalInterventions" => self.medical_interventions.get(field),
            "deliveryPreferences" => self.delivery_preferences.get(field),
            "cordAndPlacenta" => self.cord_and_placenta.get(field),
            "immediatePostpartum" => self.immediate_postpartum.get(field),
            "newbornProcedures" => self.newborn_procedures.get(field),
            "emergencyPreferences" => self.emergency_preferences.get(field),
            "postpartumCare" => self.postpartum_care.get(field),
            "feedingPlan" => self.feeding_plan.get(field),
            "culturalReligious" => self.cultural_religious.get(field),
            _ => None,
        }
    }
}

/// How a plan came to be.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlanSource {
    /// The model's document was complete and used as-is.
    Generated,
    /// The model's document was used; these `section.field` paths came
    /// from defaults.
    Completed { filled: Vec<String> },
    /// The model's output was unusable; the default document was used.
    Default { reason: String },
}

/// A synthesized plan with provenance. Immutable once created.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedPlan {
    pub plan: BirthPlan,
    pub source: PlanSource,
    pub generated_at: DateTime<Utc>,
}

impl GeneratedPlan {
    pub fn new(plan: BirthPlan, source: PlanSource) -> Arc<Self> {
        Arc::new(Self {
            plan,
            source,
            generated_at: Utc::now(),
        })
    }

    pub fn is_default(&self) -> bool {
        matches!(self.source, PlanSource::Default { .. })
    }
}
