//! Data models for shift scheduling
//!
//! This module contains the status enums stored in the database, the row
//! structs returned by queries and the request structs accepted by the admin
//! operations.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::SchedulingError;

/// Declares an enum that is stored as text and serialized with the same text.
macro_rules! text_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* #[serde(rename = $text)] $variant),+
        }

        impl $name {
            /// Every variant in declaration order
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// Text stored in the database
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = SchedulingError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(SchedulingError::validation(format!(
                        "Unknown {} value: {other}",
                        stringify!($name)
                    ))),
                }
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let text = value.as_str()?;
                text.parse()
                    .map_err(|e: SchedulingError| FromSqlError::Other(e.to_string().into()))
            }
        }
    };
}

text_enum! {
    /// Lifecycle status of a shift
    ShiftStatus {
        /// Created, awaiting the shift date
        Scheduled => "scheduled",
        /// Volunteer confirmed attendance
        Confirmed => "confirmed",
        /// Shift was worked
        Completed => "completed",
        /// Shift was called off
        Cancelled => "cancelled",
        /// Volunteer did not show up
        Absent => "absent",
    }
}

text_enum! {
    /// Volunteer's acknowledgment of an assigned shift
    ConfirmationStatus {
        /// No response yet
        Pending => "pending",
        /// Volunteer will attend
        Confirmed => "confirmed",
        /// Volunteer will not attend
        Declined => "declined",
        /// Volunteer asked for a different slot
        ChangeRequested => "change_requested",
    }
}

text_enum! {
    /// Attendance outcome recorded against a shift or attendance log
    AttendanceStatus {
        /// Not yet recorded
        Pending => "pending",
        /// Arrived, still on shift
        CheckedIn => "checked_in",
        /// Left after the shift
        CheckedOut => "checked_out",
        /// Did not attend
        Absent => "absent",
        /// Absence was excused
        Excused => "excused",
        /// Attended on time
        Present => "present",
        /// Attended late
        Late => "late",
        /// On approved leave
        OnLeave => "on_leave",
    }
}

text_enum! {
    /// Named shift templates
    ShiftType {
        /// 06:00 to 14:00
        Morning => "morning",
        /// 14:00 to 22:00
        Afternoon => "afternoon",
        /// 18:00 to 02:00
        Evening => "evening",
        /// 22:00 to 06:00
        Night => "night",
        /// 08:00 to 17:00
        FullDay => "full_day",
        /// Admin-chosen times
        Custom => "custom",
    }
}

impl ShiftType {
    /// Default start and end times, `None` for custom shifts.
    #[must_use]
    pub fn default_times(self) -> Option<(NaiveTime, NaiveTime)> {
        let (start, end) = match self {
            Self::Morning => (6, 14),
            Self::Afternoon => (14, 22),
            Self::Evening => (18, 2),
            Self::Night => (22, 6),
            Self::FullDay => (8, 17),
            Self::Custom => return None,
        };
        Some((
            NaiveTime::from_hms_opt(start, 0, 0)?,
            NaiveTime::from_hms_opt(end, 0, 0)?,
        ))
    }
}

impl Default for ShiftType {
    fn default() -> Self {
        Self::Custom
    }
}

text_enum! {
    /// Duty catalog for fire and rescue shifts
    DutyType {
        /// Fire suppression
        FireSuppression => "fire_suppression",
        /// Rescue operations
        RescueOperations => "rescue_operations",
        /// Emergency medical care
        EmergencyMedical => "emergency_medical",
        /// Hazardous materials response
        HazardousMaterials => "hazardous_materials",
        /// Technical rescue
        TechnicalRescue => "technical_rescue",
        /// Water rescue
        WaterRescue => "water_rescue",
        /// Incident command post
        CommandPost => "command_post",
        /// Logistics support
        LogisticsSupport => "logistics_support",
        /// Equipment management
        EquipmentManagement => "equipment_management",
        /// Radio communications
        Communications => "communications",
        /// First aid station
        FirstAidStation => "first_aid_station",
        /// Crowd control
        CrowdControl => "crowd_control",
        /// Post-incident investigation
        Investigation => "investigation",
        /// Salvage and overhaul
        SalvageOverhaul => "salvage_overhaul",
        /// Crew rehabilitation
        Rehabilitation => "rehabilitation",
    }
}

impl DutyType {
    /// Human readable name
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::FireSuppression => "Fire Suppression",
            Self::RescueOperations => "Rescue Operations",
            Self::EmergencyMedical => "Emergency Medical",
            Self::HazardousMaterials => "Hazardous Materials",
            Self::TechnicalRescue => "Technical Rescue",
            Self::WaterRescue => "Water Rescue",
            Self::CommandPost => "Command Post",
            Self::LogisticsSupport => "Logistics Support",
            Self::EquipmentManagement => "Equipment Management",
            Self::Communications => "Communications",
            Self::FirstAidStation => "First Aid Station",
            Self::CrowdControl => "Crowd Control",
            Self::Investigation => "Investigation",
            Self::SalvageOverhaul => "Salvage & Overhaul",
            Self::Rehabilitation => "Rehabilitation",
        }
    }

    /// Description used when the admin leaves the duty description blank
    #[must_use]
    pub const fn default_description(self) -> &'static str {
        match self {
            Self::FireSuppression => "Primary firefighting duties including hose line operations, water supply, ventilation, and search & rescue in fire conditions.",
            Self::RescueOperations => "Search and rescue operations including victim location, extrication, and technical rescue scenarios.",
            Self::EmergencyMedical => "Provide emergency medical care including patient assessment, basic life support, and stabilization until EMS arrival.",
            Self::HazardousMaterials => "Identify, contain, and mitigate hazardous materials incidents following proper protocols and safety procedures.",
            Self::TechnicalRescue => "Specialized rescue operations including high-angle, confined space, trench, and structural collapse rescue.",
            Self::WaterRescue => "Water rescue operations including shore-based rescue, boat operations, and swift water rescue techniques.",
            Self::CommandPost => "Assist with incident command system operations including communications, resource tracking, and documentation.",
            Self::LogisticsSupport => "Manage and distribute equipment, supplies, and resources to support ongoing operations.",
            Self::EquipmentManagement => "Maintain, inventory, and deploy specialized equipment and tools for emergency operations.",
            Self::Communications => "Operate radio communications, maintain communication logs, and ensure proper information flow.",
            Self::FirstAidStation => "Operate rehabilitation station providing medical monitoring, hydration, and rest for personnel.",
            Self::CrowdControl => "Maintain scene safety by controlling access, managing bystanders, and ensuring perimeter security.",
            Self::Investigation => "Assist with post-incident investigation including evidence preservation and documentation.",
            Self::SalvageOverhaul => "Perform salvage operations to protect property and overhaul to ensure complete extinguishment.",
            Self::Rehabilitation => "Monitor personnel for signs of exhaustion, provide hydration and nutrition, and ensure crew readiness.",
        }
    }

    /// Training normally required for the duty
    #[must_use]
    pub const fn default_training(self) -> &'static str {
        match self {
            Self::FireSuppression => "Basic Firefighter Training, SCBA Certification, Hose & Ladder Operations",
            Self::RescueOperations => "Technical Rescue Training, Rope Rescue Certification, Confined Space Awareness",
            Self::EmergencyMedical => "First Aid/CPR Certification, Emergency Medical Responder, Bloodborne Pathogens",
            Self::HazardousMaterials => "HazMat Awareness/Operations, Decontamination Procedures",
            Self::TechnicalRescue => "Advanced Technical Rescue Certification, Rope Systems, Patient Packaging",
            Self::WaterRescue => "Water Rescue Certification, Swift Water Training, Boat Operations",
            Self::CommandPost => "ICS Training, Resource Management, Communications Protocols",
            Self::LogisticsSupport => "Inventory Management, Supply Chain Operations",
            Self::EquipmentManagement => "Equipment Maintenance, Tool Operations, Inventory Control",
            Self::Communications => "Radio Communications, Incident Reporting, Documentation",
            Self::FirstAidStation => "First Aid/CPR, Vital Signs Monitoring, Medical Documentation",
            Self::CrowdControl => "Crowd Management, Scene Safety, Traffic Control",
            Self::Investigation => "Fire Investigation Basics, Evidence Preservation, Documentation",
            Self::SalvageOverhaul => "Salvage Operations, Overhaul Techniques, Property Conservation",
            Self::Rehabilitation => "Rehab Operations, Medical Monitoring, Crew Resource Management",
        }
    }
}

text_enum! {
    /// Importance of a duty within a shift
    DutyPriority {
        /// Primary duty
        Primary => "primary",
        /// Secondary duty
        Secondary => "secondary",
        /// Support role
        Support => "support",
    }
}

impl Default for DutyPriority {
    fn default() -> Self {
        Self::Primary
    }
}

text_enum! {
    /// Which column carries the assignee of a shift
    ShiftFor {
        /// `volunteer_id` is set
        Volunteer => "volunteer",
        /// `user_id` is set
        User => "user",
    }
}

text_enum! {
    /// Account role
    UserRole {
        /// Administrator with access to the scheduling panel
        Admin => "ADMIN",
        /// Paid staff
        Employee => "EMPLOYEE",
        /// Regular account
        User => "USER",
    }
}

text_enum! {
    /// Classification of a volunteer's historical confirmation rate
    ReliabilityTier {
        /// Rate of 80% or more
        High => "High",
        /// Rate from 60% up to 80%
        Medium => "Medium",
        /// Rate below 60%
        Low => "Low",
        /// No shift history
        New => "New",
    }
}

text_enum! {
    /// Date windows offered by the shift list
    DateBucket {
        /// Today only
        Today => "today",
        /// Tomorrow only
        Tomorrow => "tomorrow",
        /// Today through seven days ahead
        Week => "week",
        /// Today through thirty days ahead
        Month => "month",
        /// Before today
        Past => "past",
        /// After today
        Future => "future",
    }
}

/// Parse `YYYY-MM-DDTHH:MM[:SS]` or `YYYY-MM-DD HH:MM[:SS]`.
#[must_use]
pub fn parse_datetime(value: &str) -> Option<NaiveDateTime> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M",
    ];
    let value = value.trim();
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
}

/// Deserialize an optional date-time, accepting browser `datetime-local` values.
pub fn deserialize_datetime<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_datetime(value)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date/time: {value}"))),
    }
}

/// Deserialize a filter parameter where `all` or a blank value means no filter.
pub fn deserialize_filter<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("" | "all") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

/// Deserialize free text where a blank value means absent.
pub fn deserialize_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// An account that can sign in to the panel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Primary key
    pub id: i64,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Email address
    pub email: String,
    /// Role
    pub role: UserRole,
    /// Avatar path
    pub avatar: Option<String>,
}

impl User {
    /// First and last name joined by a space
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Data needed to create a user
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Email address
    pub email: String,
    /// Role
    pub role: UserRole,
}

/// A fire and rescue unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Unit {
    /// Primary key
    pub id: i64,
    /// Unit name
    pub unit_name: String,
    /// Short code
    pub unit_code: String,
    /// Unit type, e.g. Fire or Rescue
    pub unit_type: String,
    /// Station location
    pub location: Option<String>,
    /// Active or Inactive
    pub status: String,
}

/// Data needed to create a unit
#[derive(Debug, Clone, Deserialize)]
pub struct NewUnit {
    /// Unit name
    pub unit_name: String,
    /// Short code
    pub unit_code: String,
    /// Unit type
    pub unit_type: String,
    /// Station location
    pub location: Option<String>,
}

/// A registered volunteer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Volunteer {
    /// Primary key
    pub id: i64,
    /// Linked user account, if any
    pub user_id: Option<i64>,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Email address
    pub email: Option<String>,
    /// Phone number used for reminders
    pub contact_number: Option<String>,
    /// Application status (approved, pending, rejected)
    pub status: String,
    /// Service status (Active, New Volunteer, ...)
    pub volunteer_status: String,
    /// Names of the skill flags that are set
    pub skills: Vec<String>,
    /// Unit from the volunteer's active assignment
    pub unit_name: Option<String>,
    /// Code of that unit
    pub unit_code: Option<String>,
}

impl Volunteer {
    /// First and last name joined by a space
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Data needed to register a volunteer
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewVolunteer {
    /// Linked user account
    pub user_id: Option<i64>,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Email address
    pub email: Option<String>,
    /// Phone number
    pub contact_number: Option<String>,
    /// Application status
    pub status: String,
    /// Service status
    pub volunteer_status: String,
    /// Skill column names to set, see [`crate::schema::volunteers::SKILLS`]
    #[serde(default)]
    pub skills: Vec<String>,
}

/// A shift row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Shift {
    /// Primary key
    pub id: i64,
    /// Assigned employee, or the volunteer's linked user
    pub user_id: Option<i64>,
    /// Assigned volunteer
    pub volunteer_id: Option<i64>,
    /// Which of the two assignee columns is authoritative
    pub shift_for: ShiftFor,
    /// Unit
    pub unit_id: Option<i64>,
    /// Template the shift was created from
    pub shift_type: ShiftType,
    /// Date of the shift
    pub shift_date: NaiveDate,
    /// Start time
    pub start_time: NaiveTime,
    /// End time, earlier than start for overnight shifts
    pub end_time: NaiveTime,
    /// Location
    pub location: String,
    /// Lifecycle status
    pub status: ShiftStatus,
    /// Confirmation status as stored on the shift
    pub confirmation_status: Option<ConfirmationStatus>,
    /// When the shift was confirmed
    pub confirmed_at: Option<NaiveDateTime>,
    /// Reason given when declining
    pub declined_reason: Option<String>,
    /// Notes attached to a change request
    pub change_request_notes: Option<String>,
    /// Linked duty assignment
    pub duty_assignment_id: Option<i64>,
    /// Notes
    pub notes: String,
    /// Attendance status
    pub attendance_status: AttendanceStatus,
    /// Check-in time
    pub check_in: Option<NaiveDateTime>,
    /// Check-out time
    pub check_out: Option<NaiveDateTime>,
    /// Attendance notes
    pub attendance_notes: Option<String>,
    /// Admin who created the shift
    pub created_by: Option<i64>,
    /// Creation time
    pub created_at: NaiveDateTime,
    /// Last update time
    pub updated_at: NaiveDateTime,
}

/// A shift joined with its unit, creator, duty and assignee
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShiftDetail {
    /// The shift row
    #[serde(flatten)]
    pub shift: Shift,
    /// Unit name
    pub unit_name: Option<String>,
    /// Unit code
    pub unit_code: Option<String>,
    /// Unit type
    pub unit_type: Option<String>,
    /// Name of the admin who created the shift
    pub created_by_name: Option<String>,
    /// Duty type
    pub duty_type: Option<DutyType>,
    /// Duty description
    pub duty_description: Option<String>,
    /// Duty priority
    pub duty_priority: Option<DutyPriority>,
    /// Equipment required for the duty
    pub required_equipment: Option<String>,
    /// Training required for the duty
    pub required_training: Option<String>,
    /// Notes on the duty
    pub duty_notes: Option<String>,
    /// Name of the volunteer or user the shift belongs to
    pub assigned_to_name: Option<String>,
    /// Email of the volunteer or user the shift belongs to
    pub assigned_to_email: Option<String>,
}

/// A duty attached to a shift
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DutyAssignment {
    /// Primary key
    pub id: i64,
    /// Owning shift
    pub shift_id: i64,
    /// Duty type
    pub duty_type: DutyType,
    /// Description
    pub duty_description: String,
    /// Priority
    pub priority: DutyPriority,
    /// Required equipment
    pub required_equipment: Option<String>,
    /// Required training
    pub required_training: Option<String>,
    /// Notes
    pub notes: Option<String>,
    /// Creating admin
    pub created_by: Option<i64>,
    /// Creation time
    pub created_at: NaiveDateTime,
}

/// A duty assignment listed with its shift
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DutyListing {
    /// The duty
    #[serde(flatten)]
    pub duty: DutyAssignment,
    /// Shift date
    pub shift_date: NaiveDate,
    /// Shift start time
    pub start_time: NaiveTime,
    /// Shift end time
    pub end_time: NaiveTime,
    /// Name of the assigned volunteer
    pub volunteer_name: Option<String>,
    /// Unit name
    pub unit_name: Option<String>,
}

/// One page of duty assignments
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DutyPage {
    /// Rows on this page
    pub duties: Vec<DutyListing>,
    /// One-based page number
    pub page: u32,
    /// Rows per page
    pub per_page: u32,
    /// Matching rows across all pages
    pub total: i64,
    /// Number of pages
    pub total_pages: u32,
}

/// Optional duty fields submitted with a new shift
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DutyInput {
    /// Duty type
    pub duty_type: DutyType,
    /// Description, blank uses the catalog default
    #[serde(default, deserialize_with = "deserialize_text")]
    pub duty_description: Option<String>,
    /// Priority, defaults to primary
    #[serde(default)]
    pub priority: Option<DutyPriority>,
    /// Required equipment
    #[serde(default, deserialize_with = "deserialize_text")]
    pub required_equipment: Option<String>,
    /// Required training
    #[serde(default, deserialize_with = "deserialize_text")]
    pub required_training: Option<String>,
    /// Notes
    #[serde(default, deserialize_with = "deserialize_text")]
    pub notes: Option<String>,
}

impl Default for DutyType {
    fn default() -> Self {
        Self::FireSuppression
    }
}

/// Single shift form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewSingleShift {
    /// Volunteer to assign, required
    #[serde(default)]
    pub volunteer_id: Option<i64>,
    /// Unit
    #[serde(default)]
    pub unit_id: Option<i64>,
    /// Shift date
    pub shift_date: NaiveDate,
    /// Start time, defaults from the shift type
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    /// End time, defaults from the shift type
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    /// Shift type
    #[serde(default)]
    pub shift_type: ShiftType,
    /// Location, defaults to the configured station
    #[serde(default, deserialize_with = "deserialize_text")]
    pub location: Option<String>,
    /// Notes
    #[serde(default, deserialize_with = "deserialize_text")]
    pub notes: Option<String>,
    /// Duty to attach
    #[serde(default)]
    pub duty: Option<DutyInput>,
}

/// Recurring shift form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewRecurringShifts {
    /// Volunteers assigned round-robin
    #[serde(default)]
    pub volunteer_ids: Vec<i64>,
    /// Unit
    #[serde(default)]
    pub unit_id: Option<i64>,
    /// First date of the range
    pub start_date: NaiveDate,
    /// Last date of the range, inclusive
    pub end_date: NaiveDate,
    /// Weekdays to generate shifts on
    #[serde(default)]
    pub recurrence_days: Vec<Weekday>,
    /// Start time of every generated shift
    pub shift_time: NaiveTime,
    /// Length of every generated shift in hours
    pub duration_hours: u32,
    /// Shift type
    #[serde(default)]
    pub shift_type: ShiftType,
    /// Location
    #[serde(default, deserialize_with = "deserialize_text")]
    pub location: Option<String>,
    /// Notes
    #[serde(default, deserialize_with = "deserialize_text")]
    pub notes: Option<String>,
    /// Duty attached to every generated shift
    #[serde(default)]
    pub duty: Option<DutyInput>,
}

/// Bulk shift form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewBulkShifts {
    /// Volunteers, one shift each
    #[serde(default)]
    pub volunteer_ids: Vec<i64>,
    /// Unit
    #[serde(default)]
    pub unit_id: Option<i64>,
    /// Shift date
    pub shift_date: NaiveDate,
    /// Start time
    pub start_time: NaiveTime,
    /// End time
    pub end_time: NaiveTime,
    /// Shift type
    #[serde(default)]
    pub shift_type: ShiftType,
    /// Location
    #[serde(default, deserialize_with = "deserialize_text")]
    pub location: Option<String>,
    /// Notes
    #[serde(default, deserialize_with = "deserialize_text")]
    pub notes: Option<String>,
    /// Duty attached to every shift
    #[serde(default)]
    pub duty: Option<DutyInput>,
}

/// Outcome of a create action
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatedShifts {
    /// Ids of the new shifts in creation order
    pub shift_ids: Vec<i64>,
    /// Message for the admin
    pub message: String,
}

/// A shift on the confirmation board
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfirmationRow {
    /// Shift id
    pub shift_id: i64,
    /// Shift date
    pub shift_date: NaiveDate,
    /// Start time
    pub start_time: NaiveTime,
    /// End time
    pub end_time: NaiveTime,
    /// Shift type
    pub shift_type: ShiftType,
    /// Location
    pub location: String,
    /// Lifecycle status
    pub shift_status: ShiftStatus,
    /// Confirmation status stored on the shift
    pub confirmation_status: Option<ConfirmationStatus>,
    /// Status from the volunteer's response record
    pub response_status: Option<String>,
    /// Notes from the volunteer's response record
    pub response_notes: Option<String>,
    /// When the volunteer responded
    pub responded_at: Option<NaiveDateTime>,
    /// Effective confirmation status
    pub actual_status: ConfirmationStatus,
    /// When the shift was confirmed
    pub confirmed_at: Option<NaiveDateTime>,
    /// Reason given when declining
    pub declined_reason: Option<String>,
    /// Notes attached to a change request
    pub change_request_notes: Option<String>,
    /// Volunteer id
    pub volunteer_id: i64,
    /// Volunteer name
    pub volunteer_name: String,
    /// Volunteer email
    pub volunteer_email: Option<String>,
    /// Volunteer phone
    pub volunteer_phone: Option<String>,
    /// Unit id
    pub unit_id: Option<i64>,
    /// Unit name
    pub unit_name: Option<String>,
    /// Unit code
    pub unit_code: Option<String>,
}

/// Confirmation history for one volunteer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VolunteerStats {
    /// Volunteer id
    pub volunteer_id: i64,
    /// Volunteer name
    pub volunteer_name: String,
    /// Volunteer email
    pub email: Option<String>,
    /// Shifts assigned
    pub total_shifts: i64,
    /// Shifts confirmed
    pub confirmed: i64,
    /// Shifts declined
    pub declined: i64,
    /// Shifts without a response
    pub pending: i64,
    /// Shifts with a change request
    pub change_requested: i64,
    /// Date of the first assigned shift
    pub first_shift_date: Option<NaiveDate>,
    /// Date of the last assigned shift
    pub last_shift_date: Option<NaiveDate>,
    /// Average hours between shift creation and confirmation
    pub avg_confirmation_hours: Option<f64>,
    /// `confirmed / total_shifts * 100`
    pub confirmation_rate: f64,
    /// Tier derived from the rate
    pub reliability: ReliabilityTier,
}

/// A volunteer who could cover a shift
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ReplacementCandidate {
    /// Volunteer id
    pub volunteer_id: i64,
    /// First name
    pub first_name: String,
    /// Last name
    pub last_name: String,
    /// Email
    pub email: Option<String>,
    /// Phone
    pub contact_number: Option<String>,
    /// Service status
    pub volunteer_status: String,
    /// Confirmed shifts in the lookback window
    pub confirmed_past_month: i64,
    /// Date of the latest active unit assignment
    pub assignment_date: Option<NaiveDate>,
    /// Unit of that assignment
    pub unit_name: Option<String>,
    /// Names of the skill flags that are set
    pub skills: Vec<String>,
}

/// Counters shown above the shift list
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShiftStats {
    /// All shifts
    pub total: i64,
    /// Non-cancelled shifts from today on
    pub upcoming: i64,
    /// Completed shifts
    pub completed: i64,
    /// Cancelled shifts
    pub cancelled: i64,
    /// Shifts dated today
    pub today: i64,
    /// Shifts with a duty assignment
    pub with_duty: i64,
    /// Shifts awaiting confirmation
    pub pending_confirmation: i64,
    /// Confirmed shifts
    pub confirmed: i64,
    /// Shifts with a check-in
    pub checked_in: i64,
    /// Shifts marked absent
    pub absent: i64,
}

/// Filters for the confirmation board
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfirmationFilter {
    /// Single date, otherwise the upcoming window
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Effective confirmation status
    #[serde(default, deserialize_with = "deserialize_filter")]
    pub status: Option<ConfirmationStatus>,
    /// Unit id
    #[serde(default, deserialize_with = "deserialize_filter")]
    pub unit: Option<i64>,
}

/// Filters for the shift list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShiftFilter {
    /// Lifecycle status
    #[serde(default, deserialize_with = "deserialize_filter")]
    pub status: Option<ShiftStatus>,
    /// Date window
    #[serde(default, deserialize_with = "deserialize_filter")]
    pub date: Option<DateBucket>,
    /// Unit id
    #[serde(default, deserialize_with = "deserialize_filter")]
    pub unit: Option<i64>,
    /// Substring of the duty type
    #[serde(default, deserialize_with = "deserialize_filter")]
    pub duty_type: Option<String>,
    /// Free text matched against names, emails, unit, location and duty
    #[serde(default, deserialize_with = "deserialize_text")]
    pub search: Option<String>,
}

/// Filters for the duty assignment list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DutyFilter {
    /// Shift id
    #[serde(default, deserialize_with = "deserialize_filter")]
    pub shift_id: Option<i64>,
    /// Duty type
    #[serde(default, deserialize_with = "deserialize_filter")]
    pub duty_type: Option<DutyType>,
    /// One-based page number
    #[serde(default)]
    pub page: Option<u32>,
}

/// Admin edit of a shift
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShiftUpdate {
    /// New lifecycle status
    #[serde(default)]
    pub status: Option<ShiftStatus>,
    /// New confirmation status
    #[serde(default)]
    pub confirmation_status: Option<ConfirmationStatus>,
    /// Replacement notes
    #[serde(default)]
    pub notes: Option<String>,
}

/// Admin edit of a shift's attendance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceUpdate {
    /// Attendance status
    pub attendance_status: AttendanceStatus,
    /// Check-in time
    #[serde(default, deserialize_with = "deserialize_datetime")]
    pub check_in: Option<NaiveDateTime>,
    /// Check-out time
    #[serde(default, deserialize_with = "deserialize_datetime")]
    pub check_out: Option<NaiveDateTime>,
    /// Notes
    #[serde(default, deserialize_with = "deserialize_text")]
    pub attendance_notes: Option<String>,
}

/// An attendance log joined with its volunteer, shift and verifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttendanceRecord {
    /// Attendance log id
    pub attendance_id: i64,
    /// Shift id
    pub shift_id: i64,
    /// Volunteer id
    pub volunteer_id: Option<i64>,
    /// Volunteer name
    pub volunteer_name: Option<String>,
    /// Shift date
    pub shift_date: NaiveDate,
    /// Check-in time
    pub check_in: Option<NaiveDateTime>,
    /// Check-out time
    pub check_out: Option<NaiveDateTime>,
    /// Attendance status
    pub attendance_status: AttendanceStatus,
    /// Hours worked
    pub total_hours: Option<f64>,
    /// Overtime hours
    pub overtime_hours: Option<f64>,
    /// Notes
    pub notes: Option<String>,
    /// Shift type
    pub shift_type: ShiftType,
    /// Scheduled start
    pub start_time: NaiveTime,
    /// Scheduled end
    pub end_time: NaiveTime,
    /// Shift location
    pub shift_location: String,
    /// Unit name
    pub unit_name: Option<String>,
    /// Verifying admin's name
    pub verified_by_name: Option<String>,
    /// When the record was verified
    pub verified_at: Option<NaiveDateTime>,
}

/// Aggregates for the attendance monitor
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct AttendanceStats {
    /// Records in the window
    pub total_records: i64,
    /// Present records
    pub present: i64,
    /// Late records
    pub late: i64,
    /// Absent records
    pub absent: i64,
    /// Excused records
    pub excused: i64,
    /// On-leave records
    pub on_leave: i64,
    /// Distinct volunteers
    pub unique_volunteers: i64,
    /// Average hours per record with hours
    pub avg_hours_per_shift: f64,
    /// Sum of worked hours
    pub total_hours_worked: f64,
    /// Sum of overtime hours
    pub total_overtime_hours: f64,
    /// Share of present records
    pub present_percent: f64,
    /// Share of late records
    pub late_percent: f64,
    /// Share of absent records
    pub absent_percent: f64,
    /// Share of excused records
    pub excused_percent: f64,
    /// Share of on-leave records
    pub on_leave_percent: f64,
    /// Share of present or late records
    pub attendance_rate: f64,
}

/// Filters for the attendance monitor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttendanceFilter {
    /// First date, defaults to thirty days ago
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    /// Last date, defaults to today
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    /// Volunteer id
    #[serde(default, deserialize_with = "deserialize_filter")]
    pub volunteer_id: Option<i64>,
    /// Attendance status
    #[serde(default, deserialize_with = "deserialize_filter")]
    pub status: Option<AttendanceStatus>,
}

/// Admin verification of an attendance log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceReview {
    /// Attendance status
    pub attendance_status: AttendanceStatus,
    /// Notes
    #[serde(default, deserialize_with = "deserialize_text")]
    pub notes: Option<String>,
    /// Hours worked
    #[serde(default)]
    pub total_hours: Option<f64>,
    /// Overtime hours
    #[serde(default)]
    pub overtime_hours: Option<f64>,
}

/// An in-app notification
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Notification {
    /// Primary key
    pub id: i64,
    /// Recipient
    pub user_id: i64,
    /// Notification type, e.g. `new_shift`
    pub kind: String,
    /// Title
    pub title: String,
    /// Message
    pub message: String,
    /// Related record id
    pub related_id: Option<i64>,
    /// Whether the recipient has read it
    pub is_read: bool,
    /// Creation time
    pub created_at: NaiveDateTime,
}
