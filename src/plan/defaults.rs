//! The default birth plan used when synthesis produces nothing usable.
//!
//! Values are placeholders, never medical choices: the assistant records
//! preferences and does not make them up.

use super::model::*;

/// Placeholder for preferences that were not discussed.
pub const TO_BE_DISCUSSED: &str = "To be discussed with healthcare team";

/// Placeholder for personal details the parents have not given.
pub const TO_BE_PROVIDED: &str = "To be provided";

/// Placeholder for optional details with nothing to report.
pub const NOT_SPECIFIED: &str = "Not specified";

const DEFAULT_NOTES: &str = "We appreciate the support of our healthcare team and trust their \
judgment for the safety of mother and baby.";

fn discuss() -> String {
    TO_BE_DISCUSSED.to_string()
}

fn provide() -> String {
    TO_BE_PROVIDED.to_string()
}

fn unspecified() -> String {
    NOT_SPECIFIED.to_string()
}

impl Default for BirthPlan {
    /// A complete plan where every field holds a placeholder.
    fn default() -> Self {
        Self {
            personal_info: PersonalInfo {
                parent_names: provide(),
                due_date: provide(),
                provider: provide(),
                hospital: provide(),
                emergency_contacts: provide(),
                medical_history: unspecified(),
                blood_type: "Unknown".to_string(),
            },
            support_team: SupportTeam {
                support_people: discuss(),
                doula: unspecified(),
                communication_preferences: discuss(),
                visitors: discuss(),
                photography: discuss(),
                student_observers: discuss(),
            },
            labor_preferences: LaborPreferences {
                environment: discuss(),
                atmosphere: discuss(),
                movement: discuss(),
                labor_positions: discuss(),
                hydrotherapy: discuss(),
                eating_drinking: discuss(),
                clothing: discuss(),
                encouragement: discuss(),
            },
            pain_management: PainManagement {
                preferred_methods: discuss(),
                natural_comfort: discuss(),
                avoid_methods: unspecified(),
                epidural_timing: discuss(),
                backup_plan: discuss(),
            },
            medical_interventions: MedicalInterventions {
                monitoring: discuss(),
                cervical_checks: discuss(),
                iv_fluids: discuss(),
                induction: discuss(),
                augmentation: discuss(),
                amniotomy: discuss(),
                internal_monitoring: discuss(),
                catheter: discuss(),
            },
            delivery_preferences: DeliveryPreferences {
                positions: discuss(),
                pushing: discuss(),
                perineal_care: discuss(),
                assisted_delivery: discuss(),
                who_catches_baby: discuss(),
                who_announces_sex: discuss(),
                mirror: unspecified(),
            },
            cord_and_placenta: CordAndPlacenta {
                delayed_cord_clamping: discuss(),
                cord_cutting: discuss(),
                cord_blood_banking: discuss(),
                placenta: discuss(),
                lotus: unspecified(),
            },
            immediate_postpartum: ImmediatePostpartum {
                skin_to_skin: discuss(),
                first_feed: discuss(),
                baby_exams: discuss(),
                weight: discuss(),
                family_time: discuss(),
            },
            newborn_procedures: NewbornProcedures {
                vitamin_k: discuss(),
                eye_ointment: discuss(),
                hepatitis_b: discuss(),
                newborn_screening: discuss(),
                hearing: discuss(),
                first_bath: discuss(),
                circumcision: discuss(),
                vaccinations: discuss(),
            },
            emergency_preferences: EmergencyPreferences {
                cesarean_preferences: discuss(),
                cesarean_details: discuss(),
                nicu_preferences: discuss(),
                unexpected_situations: "Keep us informed and prioritize the safety of mother and baby"
                    .to_string(),
                decision_maker: discuss(),
            },
            postpartum_care: PostpartumCare {
                rooming: discuss(),
                mother_care: discuss(),
                circumcision_timing: unspecified(),
                jaundice_protocol: discuss(),
            },
            feeding_plan: FeedingPlan {
                method: discuss(),
                first_feed: discuss(),
                lactation_support: discuss(),
                pacifiers: discuss(),
                bottles: discuss(),
                supplements: discuss(),
                donor_milk: discuss(),
            },
            cultural_religious: CulturalReligious {
                practices: unspecified(),
                dietary: unspecified(),
                rituals: unspecified(),
                naming: unspecified(),
                placenta: unspecified(),
            },
            additional_notes: DEFAULT_NOTES.to_string(),
        }
    }
}
