use serde::{Deserialize, Serialize};

/// Input widget a field is rendered with; drives the parameter type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    Text,
    Email,
    Number,
    Date,
    Time,
    Select,
    Checkbox,
    Textarea,
    RadioGroup,
    Duration,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormField {
    /// Snake-case key; the function is named `update_<identifier>`
    pub identifier: String,
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
}

/// A named set of form fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub fields: Vec<FormField>,
}

impl FormField {
    pub fn new(
        identifier: &str,
        name: &str,
        kind: FieldKind,
        required: bool,
        description: &str,
    ) -> Self {
        Self {
            identifier: identifier.to_string(),
            name: name.to_string(),
            label: None,
            kind,
            required,
            description: Some(description.to_string()),
            options: None,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = Some(options.iter().map(|o| o.to_string()).collect());
        self
    }
}

/// Templates available without a template file
pub fn default_templates() -> Vec<Template> {
    vec![
        Template {
            name: "Restaurant Booking".to_string(),
            description: Some(
                "For speech about making restaurant reservations, booking tables, or dining requests"
                    .to_string(),
            ),
            fields: vec![
                FormField::new(
                    "customer_name",
                    "Customer Name",
                    FieldKind::Text,
                    true,
                    "Full name of the person making the reservation",
                ),
                FormField::new(
                    "party_size",
                    "Party Size",
                    FieldKind::Number,
                    true,
                    "Number of people for the reservation",
                ),
                FormField::new(
                    "date",
                    "Date",
                    FieldKind::Date,
                    true,
                    "Date for the reservation",
                )
                .with_label("Reservation Date"),
                FormField::new(
                    "time",
                    "Time",
                    FieldKind::Time,
                    true,
                    "Time for the reservation",
                )
                .with_label("Reservation Time"),
                FormField::new(
                    "special_requests",
                    "Special Requests",
                    FieldKind::Textarea,
                    false,
                    "Any special dietary requirements or requests",
                ),
            ],
        },
        Template {
            name: "Meeting Scheduling".to_string(),
            description: Some(
                "For speech about scheduling meetings, appointments, or calendar events".to_string(),
            ),
            fields: vec![
                FormField::new(
                    "meeting_title",
                    "Meeting Title",
                    FieldKind::Text,
                    true,
                    "Title or subject of the meeting",
                ),
                FormField::new(
                    "participants",
                    "Participants",
                    FieldKind::Textarea,
                    true,
                    "List of meeting participants",
                ),
                FormField::new(
                    "meeting_date",
                    "Meeting Date",
                    FieldKind::Date,
                    true,
                    "Date of the meeting",
                ),
                FormField::new(
                    "meeting_time",
                    "Meeting Time",
                    FieldKind::Time,
                    true,
                    "Start time of the meeting",
                ),
                FormField::new(
                    "duration",
                    "Duration",
                    FieldKind::Number,
                    true,
                    "Meeting duration in minutes",
                ),
                FormField::new(
                    "location",
                    "Location",
                    FieldKind::Select,
                    true,
                    "Meeting location or platform",
                )
                .with_options(&[
                    "Conference Room A",
                    "Conference Room B",
                    "Zoom",
                    "Teams",
                    "Google Meet",
                ]),
            ],
        },
        Template {
            name: "Product Ordering".to_string(),
            description: Some(
                "For speech about ordering products, making purchases, or shopping requests"
                    .to_string(),
            ),
            fields: vec![
                FormField::new(
                    "product_name",
                    "Product Name",
                    FieldKind::Text,
                    true,
                    "Name of the product being ordered",
                ),
                FormField::new(
                    "quantity",
                    "Quantity",
                    FieldKind::Number,
                    true,
                    "Number of items to order",
                ),
                FormField::new(
                    "customer_name",
                    "Customer Name",
                    FieldKind::Text,
                    true,
                    "Name of the customer placing the order",
                ),
                FormField::new(
                    "shipping_address",
                    "Shipping Address",
                    FieldKind::Textarea,
                    true,
                    "Complete shipping address",
                ),
                FormField::new(
                    "shipping_method",
                    "Shipping Method",
                    FieldKind::Select,
                    true,
                    "Preferred shipping method",
                )
                .with_options(&[
                    "Standard (5-7 days)",
                    "Express (2-3 days)",
                    "Overnight",
                    "Same Day",
                ]),
                FormField::new(
                    "gift_wrap",
                    "Gift Wrap",
                    FieldKind::Checkbox,
                    false,
                    "Whether to include gift wrapping",
                ),
            ],
        },
    ]
}
