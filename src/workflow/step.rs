use serde::{Deserialize, Serialize};

pub const STEP_COUNT: u8 = 8;

/// The eight stages of the landing-page pipeline, in fixed order. Each stage
/// carries its generation knobs, the input fields it accepts from the user,
/// and the output keys its structured response must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Research,
    Outline,
    Hero,
    PasCopy,
    SocialProof,
    FinalCta,
    Assembly,
    Design,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text { min: usize, max: usize },
    Choice(&'static [&'static str]),
    Url,
    Integer { min: i64, max: i64 },
    Flag,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn required(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: true,
    }
}

const fn optional(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec {
        name,
        kind,
        required: false,
    }
}

pub const INDUSTRIES: &[&str] = &[
    "Health & Wellness",
    "Fitness & Nutrition",
    "Software/SaaS",
    "Education/Courses",
    "Finance/Investment",
    "Beauty & Skincare",
    "Home & Garden",
    "Business Services",
    "Other",
];

pub const BUDGET_RANGES: &[&str] = &[
    "Under $1,000",
    "$1,000 - $5,000",
    "$5,000 - $15,000",
    "$15,000 - $50,000",
    "Over $50,000",
];

pub const PAGE_TYPES: &[&str] = &[
    "Affiliate/Review",
    "Direct Product Sales",
    "SaaS/Software",
    "Course/Education",
];

pub const PRODUCT_TYPES: &[&str] = &[
    "Supplement/Health",
    "Software/App",
    "Course/Education",
    "Physical Product",
    "Service",
];

pub const HEADLINE_STYLES: &[&str] = &[
    "Problem-Focused",
    "Benefit-Focused",
    "Question-Based",
    "Urgency-Driven",
];

pub const TONES: &[&str] = &[
    "Professional",
    "Conversational",
    "Urgent",
    "Authoritative",
    "Friendly",
];

pub const TARGET_EMOTIONS: &[&str] = &[
    "Urgency",
    "Relief",
    "Excitement",
    "Trust",
    "Fear of Missing Out",
];

pub const CTA_STYLES: &[&str] = &[
    "Action-Oriented",
    "Benefit-Driven",
    "Urgency-Based",
    "Risk-Free",
];

pub const AGITATION_FORMATS: &[&str] = &["Consequence Bullets", "Narrative Scenario", "Day-in-the-Life"];

pub const BENEFITS_FORMATS: &[&str] = &["Benefit Blocks", "Icon Grid", "Numbered List"];

pub const URGENCY_TYPES: &[&str] = &["Limited Time Offer", "Limited Stock", "Bonus Expiry", "None"];

pub const GUARANTEE_TYPES: &[&str] = &["30-day", "60-day", "90-day", "Lifetime"];

pub const LAYOUT_TYPES: &[&str] = &["Single Column", "Split Hero", "Full Width"];

pub const WCAG_LEVELS: &[&str] = &["AA", "AAA"];

const RESEARCH_INPUTS: &[FieldSpec] = &[
    required("product_name", FieldKind::Text { min: 2, max: 120 }),
    required("target_audience", FieldKind::Text { min: 12, max: 2000 }),
    required("industry", FieldKind::Choice(INDUSTRIES)),
    optional("target_url", FieldKind::Url),
    optional("budget_range", FieldKind::Choice(BUDGET_RANGES)),
];

const OUTLINE_INPUTS: &[FieldSpec] = &[
    required("page_type", FieldKind::Choice(PAGE_TYPES)),
    required("product_type", FieldKind::Choice(PRODUCT_TYPES)),
    optional("include_agitation", FieldKind::Flag),
    optional("include_comparison", FieldKind::Flag),
    optional("include_qualifier", FieldKind::Flag),
    optional("include_before_after", FieldKind::Flag),
];

const HERO_INPUTS: &[FieldSpec] = &[
    required("headline_style", FieldKind::Choice(HEADLINE_STYLES)),
    required("tone", FieldKind::Choice(TONES)),
    required("target_emotion", FieldKind::Choice(TARGET_EMOTIONS)),
    required("cta_style", FieldKind::Choice(CTA_STYLES)),
    optional("variants", FieldKind::Integer { min: 2, max: 5 }),
];

const PAS_COPY_INPUTS: &[FieldSpec] = &[
    required("agitation_format", FieldKind::Choice(AGITATION_FORMATS)),
    required("benefits_format", FieldKind::Choice(BENEFITS_FORMATS)),
    optional("emotional_intensity", FieldKind::Integer { min: 1, max: 10 }),
    optional("include_statistics", FieldKind::Flag),
];

const SOCIAL_PROOF_INPUTS: &[FieldSpec] = &[
    optional("testimonial_count", FieldKind::Integer { min: 1, max: 8 }),
    optional("competitors_count", FieldKind::Integer { min: 2, max: 5 }),
    optional("include_comparison", FieldKind::Flag),
    optional("include_qualifier", FieldKind::Flag),
    optional("include_before_after", FieldKind::Flag),
];

const FINAL_CTA_INPUTS: &[FieldSpec] = &[
    required("urgency_type", FieldKind::Choice(URGENCY_TYPES)),
    required("guarantee_type", FieldKind::Choice(GUARANTEE_TYPES)),
    optional("include_roadmap", FieldKind::Flag),
    optional("include_secondary_cta", FieldKind::Flag),
];

const ASSEMBLY_INPUTS: &[FieldSpec] = &[
    optional("check_terminology", FieldKind::Flag),
    optional("check_claims", FieldKind::Flag),
    optional("check_emotional_arc", FieldKind::Flag),
];

const DESIGN_INPUTS: &[FieldSpec] = &[
    required("layout_type", FieldKind::Choice(LAYOUT_TYPES)),
    optional("wcag_level", FieldKind::Choice(WCAG_LEVELS)),
    optional("hero_viewport", FieldKind::Integer { min: 50, max: 80 }),
    optional("mobile_first", FieldKind::Flag),
    optional("interactive_comparison", FieldKind::Flag),
];

impl Step {
    pub const ALL: [Step; STEP_COUNT as usize] = [
        Step::Research,
        Step::Outline,
        Step::Hero,
        Step::PasCopy,
        Step::SocialProof,
        Step::FinalCta,
        Step::Assembly,
        Step::Design,
    ];

    pub fn index(self) -> u8 {
        match self {
            Step::Research => 1,
            Step::Outline => 2,
            Step::Hero => 3,
            Step::PasCopy => 4,
            Step::SocialProof => 5,
            Step::FinalCta => 6,
            Step::Assembly => 7,
            Step::Design => 8,
        }
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Step::ALL.get(index.checked_sub(1)? as usize).copied()
    }

    pub fn slug(self) -> &'static str {
        match self {
            Step::Research => "research",
            Step::Outline => "outline",
            Step::Hero => "hero",
            Step::PasCopy => "pas_copy",
            Step::SocialProof => "social_proof",
            Step::FinalCta => "final_cta",
            Step::Assembly => "assembly",
            Step::Design => "design",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::Research => "Product Research & Intelligence",
            Step::Outline => "Landing Page Outline",
            Step::Hero => "Hero Section Copy",
            Step::PasCopy => "Problem-Agitate-Solution Copy",
            Step::SocialProof => "Social Proof & Comparisons",
            Step::FinalCta => "Final CTA & Roadmap",
            Step::Assembly => "Assembly & Consistency",
            Step::Design => "Design & Technical Specs",
        }
    }

    pub fn temperature(self) -> f64 {
        match self {
            Step::Research => 0.3,
            Step::Outline => 0.4,
            Step::Hero => 0.7,
            Step::PasCopy => 0.7,
            Step::SocialProof => 0.6,
            Step::FinalCta => 0.6,
            Step::Assembly => 0.2,
            Step::Design => 0.3,
        }
    }

    pub fn max_tokens(self) -> u32 {
        match self {
            Step::Research => 3000,
            Step::Outline => 2000,
            Step::Hero => 1500,
            Step::PasCopy => 3000,
            Step::SocialProof => 2500,
            Step::FinalCta => 2000,
            Step::Assembly => 2000,
            Step::Design => 2500,
        }
    }

    pub fn input_fields(self) -> &'static [FieldSpec] {
        match self {
            Step::Research => RESEARCH_INPUTS,
            Step::Outline => OUTLINE_INPUTS,
            Step::Hero => HERO_INPUTS,
            Step::PasCopy => PAS_COPY_INPUTS,
            Step::SocialProof => SOCIAL_PROOF_INPUTS,
            Step::FinalCta => FINAL_CTA_INPUTS,
            Step::Assembly => ASSEMBLY_INPUTS,
            Step::Design => DESIGN_INPUTS,
        }
    }

    /// Required keys of the step's structured response (its schema).
    pub fn required_output_keys(self) -> &'static [&'static str] {
        match self {
            Step::Research => &[
                "product_analysis",
                "target_audience_profile",
                "competitive_landscape",
                "conversion_intelligence",
                "ppc_campaign_strategy",
            ],
            Step::Outline => &["structure", "terminology_standards"],
            Step::Hero => &[
                "headline_primary",
                "subheadline_primary",
                "cta_button_primary",
                "variants",
            ],
            Step::PasCopy => &[
                "problem_identification",
                "agitation_module",
                "solution_reveal",
                "benefits_matrix",
            ],
            Step::SocialProof => &[
                "testimonials",
                "comparison_table",
                "audience_qualifier",
                "data_points",
            ],
            Step::FinalCta => &[
                "cta_headline",
                "sub_copy",
                "what_happens_next_roadmap",
                "primary_cta_button",
                "trust_signals",
            ],
            Step::Assembly => &["assembly_summary", "consistency_results", "quality_score"],
            Step::Design => &[
                "layout_specifications",
                "visual_design",
                "performance_targets",
                "accessibility",
            ],
        }
    }
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.slug())
    }
}
