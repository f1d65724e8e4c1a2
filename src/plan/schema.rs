//! Schema registry: the canonical shape of a birth plan.
//!
//! Section and field keys match the serialized `BirthPlan` exactly; the
//! descriptions instruct plan synthesis and the labels drive rendering.

use serde_json::{Map, Value};

/// One field inside a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub description: &'static str,
}

/// One top-level section of the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSpec {
    pub key: &'static str,
    pub title: &'static str,
    pub fields: &'static [FieldSpec],
}

impl SectionSpec {
    pub fn field(&self, key: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.key == key)
    }
}

/// Key of the free-text notes entry that follows the sections.
pub const ADDITIONAL_NOTES_KEY: &str = "additionalNotes";

pub const ADDITIONAL_NOTES_DESCRIPTION: &str =
    "Any other preferences, concerns, or notes that don't fit in above categories";

macro_rules! field {
    ($key:expr, $label:expr, $description:expr $(,)?) => {
        FieldSpec {
            key: $key,
            label: $label,
            description: $description,
        }
    };
}

static SECTIONS: [SectionSpec; 13] = [
    SectionSpec {
        key: "personalInfo",
        title: "Personal Information",
        fields: &[
            field!("parentNames", "Parents", "Names of expecting parents"),
            field!("dueDate", "Due Date", "Expected due date"),
            field!("provider", "Healthcare Provider", "Healthcare provider/practice name"),
            field!("hospital", "Birth Location", "Planned birth location"),
            field!("emergencyContacts", "Emergency Contacts", "Emergency contact names and numbers"),
            field!(
                "medicalHistory",
                "Medical History/Allergies",
                "Relevant medical history, allergies, previous births",
            ),
            field!("bloodType", "Blood Type", "Blood type if known"),
        ],
    },
    SectionSpec {
        key: "supportTeam",
        title: "Support Team & Communication",
        fields: &[
            field!("supportPeople", "Support People", "Who will be present during labor and delivery"),
            field!("doula", "Doula", "Doula information if applicable"),
            field!("communicationPreferences", "Communication", "Who answers questions during labor"),
            field!("visitors", "Visitors", "Visitor policy during labor and after birth"),
            field!("photography", "Photography", "Photo/video preferences and restrictions"),
            field!("studentObservers", "Student Observers", "Preferences about medical students/residents"),
        ],
    },
    SectionSpec {
        key: "laborPreferences",
        title: "Labor Environment & Comfort",
        fields: &[
            field!(
                "environment",
                "Environment",
                "Room environment (lighting, music, aromatherapy, temperature)",
            ),
            field!("atmosphere", "Atmosphere", "Specific music playlists, essential oils, etc."),
            field!("movement", "Movement", "Freedom to move, walk, change positions"),
            field!("laborPositions", "Positions", "Preferred positions for laboring"),
            field!("hydrotherapy", "Hydrotherapy", "Use of shower, tub, birthing pool"),
            field!("eatingDrinking", "Eating/Drinking", "Preferences for eating/drinking during labor"),
            field!("clothing", "Clothing", "What to wear during labor"),
            field!("encouragement", "Encouragement", "How you want to be coached/encouraged"),
        ],
    },
    SectionSpec {
        key: "painManagement",
        title: "Pain Management",
        fields: &[
            field!(
                "preferredMethods",
                "Preferred Methods",
                "Natural methods, epidural, IV meds, nitrous oxide, etc.",
            ),
            field!(
                "naturalComfort",
                "Natural Comfort Measures",
                "Massage, breathing, hypnobirthing, TENS unit, etc.",
            ),
            field!("avoidMethods", "Methods to Avoid", "Pain relief methods to avoid"),
            field!("epiduralTiming", "Epidural Timing", "When to offer epidural if desired"),
            field!("backupPlan", "Backup Plan", "If first choice isn't available"),
        ],
    },
    SectionSpec {
        key: "medicalInterventions",
        title: "Medical Interventions",
        fields: &[
            field!("monitoring", "Fetal Monitoring", "Continuous vs intermittent fetal monitoring"),
            field!("cervicalChecks", "Cervical Exams", "Frequency of cervical exams"),
            field!("ivFluids", "IV/Fluids", "IV vs heparin lock preferences"),
            field!("induction", "Labor Induction", "Preferences if induction needed"),
            field!("augmentation", "Pitocin", "Pitocin use preferences"),
            field!("amniotomy", "Breaking Water", "Breaking water preferences"),
            field!("internalMonitoring", "Internal Monitoring", "Internal monitoring preferences"),
            field!("catheter", "Catheter", "Catheter preferences"),
        ],
    },
    SectionSpec {
        key: "deliveryPreferences",
        title: "Delivery Preferences",
        fields: &[
            field!("positions", "Positions", "Preferred delivery positions"),
            field!("pushing", "Pushing", "Directed vs spontaneous pushing"),
            field!("perinealCare", "Perineal Care", "Episiotomy, perineal massage preferences"),
            field!("assistedDelivery", "Assisted Delivery", "Forceps/vacuum preferences"),
            field!("whoCatchesBaby", "Who Catches Baby", "Who catches the baby"),
            field!("whoAnnouncesSex", "Who Announces Sex", "Who announces baby's sex"),
            field!("mirror", "Mirror", "Use mirror to see birth"),
        ],
    },
    SectionSpec {
        key: "cordAndPlacenta",
        title: "Umbilical Cord & Placenta",
        fields: &[
            field!("delayedCordClamping", "Delayed Cord Clamping", "How long to delay (specific time)"),
            field!("cordCutting", "Who Cuts Cord", "Who cuts the cord"),
            field!("cordBloodBanking", "Cord Blood Banking", "Banking or donation plans"),
            field!("placenta", "Placenta", "Delivery method and disposal/keeping preferences"),
            field!("lotus", "Lotus Birth", "Lotus birth preferences if applicable"),
        ],
    },
    SectionSpec {
        key: "immediatePostpartum",
        title: "Immediate After Birth",
        fields: &[
            field!("skinToSkin", "Skin-to-Skin", "Immediate skin-to-skin duration and preferences"),
            field!("firstFeed", "First Feeding", "When to initiate first feeding"),
            field!("babyExams", "Baby Exams", "Where exams happen (on chest, in room, warmer)"),
            field!("weight", "Weighing Baby", "When to weigh baby"),
            field!("familyTime", "Family Time", "Uninterrupted bonding time preferences"),
        ],
    },
    SectionSpec {
        key: "newbornProcedures",
        title: "Newborn Procedures",
        fields: &[
            field!("vitaminK", "Vitamin K", "Shot vs oral drops, timing"),
            field!("eyeOintment", "Eye Ointment", "Yes/no, timing preferences"),
            field!("hepatitisB", "Hepatitis B Vaccine", "At birth or delay preferences"),
            field!("newbornScreening", "Newborn Screening", "Standard screening acceptance"),
            field!("hearing", "Hearing Test", "Hearing test preferences"),
            field!("firstBath", "First Bath", "Timing (immediate, 24hr, 48hr delay)"),
            field!("circumcision", "Circumcision", "Decision and timing if applicable"),
            field!("vaccinations", "Vaccinations", "Any specific vaccination preferences"),
        ],
    },
    SectionSpec {
        key: "emergencyPreferences",
        title: "Emergency Situations",
        fields: &[
            field!(
                "cesareanPreferences",
                "C-Section Preferences",
                "Music, drape type, partner present, immediate skin-to-skin",
            ),
            field!(
                "cesareanDetails",
                "C-Section Details",
                "Arms free, delayed cord clamping if possible",
            ),
            field!(
                "nicuPreferences",
                "NICU Preferences",
                "Parent accompaniment, bonding before transfer",
            ),
            field!(
                "unexpectedSituations",
                "Unexpected Situations",
                "General preferences for emergencies",
            ),
            field!("decisionMaker", "Decision Maker", "Who makes decisions if you cannot"),
        ],
    },
    SectionSpec {
        key: "postpartumCare",
        title: "Postpartum Care",
        fields: &[
            field!("rooming", "Rooming", "Baby rooming-in vs nursery preferences"),
            field!("motherCare", "Mother's Care", "Preferences for your own care"),
            field!("circumcisionTiming", "Circumcision Timing", "If applicable, when to perform"),
            field!("jaundiceProtocol", "Jaundice Protocol", "Preferences if baby has jaundice"),
        ],
    },
    SectionSpec {
        key: "feedingPlan",
        title: "Feeding Plan",
        fields: &[
            field!("method", "Method", "Breastfeeding, formula, or combination"),
            field!("firstFeed", "First Feed", "Timing and assistance preferences"),
            field!("lactationSupport", "Lactation Support", "When to see consultant"),
            field!("pacifiers", "Pacifiers", "Yes/no and timing"),
            field!("bottles", "Bottles", "Introduction preferences"),
            field!("supplements", "Supplements", "Formula supplementation preferences"),
            field!("donorMilk", "Donor Milk", "Preferences if needed"),
        ],
    },
    SectionSpec {
        key: "culturalReligious",
        title: "Cultural & Religious Preferences",
        fields: &[
            field!("practices", "Practices", "Specific cultural or religious practices"),
            field!("dietary", "Dietary", "Dietary restrictions for meals"),
            field!("rituals", "Rituals", "Birth rituals or blessings"),
            field!("naming", "Naming", "Naming ceremony preferences"),
            field!("placenta", "Placenta Practices", "Cultural placenta practices"),
        ],
    },
];

/// All sections, in document order.
pub fn sections() -> &'static [SectionSpec] {
    &SECTIONS
}

/// Look up a section by its key.
pub fn section(key: &str) -> Option<&'static SectionSpec> {
    SECTIONS.iter().find(|s| s.key == key)
}

/// The JSON template embedded in the synthesis instruction: every key
/// mapped to its description.
pub fn schema_template() -> Value {
    let mut root = Map::new();
    for section in sections() {
        let fields: Map<String, Value> = section
            .fields
            .iter()
            .map(|f| (f.key.to_string(), Value::String(f.description.to_string())))
            .collect();
        root.insert(section.key.to_string(), Value::Object(fields));
    }
    root.insert(
        ADDITIONAL_NOTES_KEY.to_string(),
        Value::String(ADDITIONAL_NOTES_DESCRIPTION.to_string()),
    );
    Value::Object(root)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn thirteen_sections_with_unique_keys() {
        let keys: HashSet<_> = sections().iter().map(|s| s.key).collect();
        assert_eq!(keys.len(), 13);
        assert!(!keys.contains(ADDITIONAL_NOTES_KEY));
    }

    #[test]
    fn field_keys_unique_within_section() {
        for section in sections() {
            let keys: HashSet<_> = section.fields.iter().map(|f| f.key).collect();
            assert_eq!(keys.len(), section.fields.len(), "duplicate in {}", section.key);
            assert!(!section.fields.is_empty());
        }
    }

    #[test]
    fn lookup_by_key() {
        let pain = section("painManagement").unwrap();
        assert_eq!(pain.title, "Pain Management");
        assert_eq!(pain.field("epiduralTiming").unwrap().label, "Epidural Timing");
        assert!(section("birthday").is_none());
        assert!(pain.field("vitaminK").is_none());
    }

    #[test]
    fn template_lists_every_field_with_description() {
        let template = schema_template();
        let obj = template.as_object().unwrap();
        assert_eq!(obj.len(), 14);
        assert_eq!(
            template["cordAndPlacenta"]["delayedCordClamping"],
            "How long to delay (specific time)"
        );
        assert_eq!(template[ADDITIONAL_NOTES_KEY], ADDITIONAL_NOTES_DESCRIPTION);
    }
}
