//! Database schema definitions
//!
//! Constants for table and column names used when composing rusqlite queries.
//! The tables themselves are created by the SQL files under `migrations/`.

/// Users table schema
pub mod users {
    /// Table name
    pub const TABLE: &str = "users";
    /// Primary key column
    pub const ID: &str = "id";
    /// First name column
    pub const FIRST_NAME: &str = "first_name";
    /// Last name column
    pub const LAST_NAME: &str = "last_name";
    /// Email address column
    pub const EMAIL: &str = "email";
    /// Role column (ADMIN, EMPLOYEE, USER)
    pub const ROLE: &str = "role";
    /// Avatar path column
    pub const AVATAR: &str = "avatar";
    /// Creation timestamp column
    pub const CREATED_AT: &str = "created_at";
}

/// Login sessions table schema
pub mod sessions {
    /// Table name
    pub const TABLE: &str = "sessions";
    /// Opaque session token (primary key)
    pub const TOKEN: &str = "token";
    /// Owning user column
    pub const USER_ID: &str = "user_id";
    /// Creation timestamp column
    pub const CREATED_AT: &str = "created_at";
    /// Expiry timestamp column
    pub const EXPIRES_AT: &str = "expires_at";
}

/// Units table schema
pub mod units {
    /// Table name
    pub const TABLE: &str = "units";
    /// Primary key column
    pub const ID: &str = "id";
    /// Unit name column
    pub const UNIT_NAME: &str = "unit_name";
    /// Unit code column
    pub const UNIT_CODE: &str = "unit_code";
    /// Unit type column
    pub const UNIT_TYPE: &str = "unit_type";
    /// Station location column
    pub const LOCATION: &str = "location";
    /// Status column
    pub const STATUS: &str = "status";
}

/// Volunteers table schema
pub mod volunteers {
    /// Table name
    pub const TABLE: &str = "volunteers";
    /// Primary key column
    pub const ID: &str = "id";
    /// Linked user account column
    pub const USER_ID: &str = "user_id";
    /// First name column
    pub const FIRST_NAME: &str = "first_name";
    /// Last name column
    pub const LAST_NAME: &str = "last_name";
    /// Email column
    pub const EMAIL: &str = "email";
    /// Contact number column
    pub const CONTACT_NUMBER: &str = "contact_number";
    /// Application status column (approved, pending, rejected)
    pub const STATUS: &str = "status";
    /// Service status column (Active, New Volunteer, Inactive, On Leave)
    pub const VOLUNTEER_STATUS: &str = "volunteer_status";
    /// Skill flag columns
    pub const SKILLS: [&str; 7] = [
        "skills_basic_firefighting",
        "skills_first_aid_cpr",
        "skills_search_rescue",
        "skills_driving",
        "skills_communication",
        "skills_mechanical",
        "skills_logistics",
    ];
    /// Creation timestamp column
    pub const CREATED_AT: &str = "created_at";
}

/// Volunteer-to-unit assignments
pub mod volunteer_assignments {
    /// Table name
    pub const TABLE: &str = "volunteer_assignments";
    /// Primary key column
    pub const ID: &str = "id";
    /// Volunteer column
    pub const VOLUNTEER_ID: &str = "volunteer_id";
    /// Unit column
    pub const UNIT_ID: &str = "unit_id";
    /// Date of the assignment
    pub const ASSIGNMENT_DATE: &str = "assignment_date";
    /// Status column (active, inactive)
    pub const STATUS: &str = "status";
}

/// Shifts table schema
pub mod shifts {
    /// Table name
    pub const TABLE: &str = "shifts";
    /// Primary key column
    pub const ID: &str = "id";
    /// Employee assignment column, also the volunteer's linked user
    pub const USER_ID: &str = "user_id";
    /// Volunteer assignment column
    pub const VOLUNTEER_ID: &str = "volunteer_id";
    /// Assignment target discriminator (volunteer, user)
    pub const SHIFT_FOR: &str = "shift_for";
    /// Unit column
    pub const UNIT_ID: &str = "unit_id";
    /// Shift type column
    pub const SHIFT_TYPE: &str = "shift_type";
    /// Date column
    pub const SHIFT_DATE: &str = "shift_date";
    /// Start time column
    pub const START_TIME: &str = "start_time";
    /// End time column
    pub const END_TIME: &str = "end_time";
    /// Location column
    pub const LOCATION: &str = "location";
    /// Lifecycle status column
    pub const STATUS: &str = "status";
    /// Confirmation status column
    pub const CONFIRMATION_STATUS: &str = "confirmation_status";
    /// Timestamp of the confirmation
    pub const CONFIRMED_AT: &str = "confirmed_at";
    /// Reason given when declining
    pub const DECLINED_REASON: &str = "declined_reason";
    /// Notes attached to a change request
    pub const CHANGE_REQUEST_NOTES: &str = "change_request_notes";
    /// Linked duty assignment column
    pub const DUTY_ASSIGNMENT_ID: &str = "duty_assignment_id";
    /// Free-form notes
    pub const NOTES: &str = "notes";
    /// Attendance status column
    pub const ATTENDANCE_STATUS: &str = "attendance_status";
    /// Check-in timestamp column
    pub const CHECK_IN: &str = "check_in";
    /// Check-out timestamp column
    pub const CHECK_OUT: &str = "check_out";
    /// Attendance notes column
    pub const ATTENDANCE_NOTES: &str = "attendance_notes";
    /// Creating admin column
    pub const CREATED_BY: &str = "created_by";
    /// Creation timestamp column
    pub const CREATED_AT: &str = "created_at";
    /// Last update timestamp column
    pub const UPDATED_AT: &str = "updated_at";
}

/// Duty assignments table schema
pub mod duty_assignments {
    /// Table name
    pub const TABLE: &str = "duty_assignments";
    /// Primary key column
    pub const ID: &str = "id";
    /// Owning shift column
    pub const SHIFT_ID: &str = "shift_id";
    /// Duty type column
    pub const DUTY_TYPE: &str = "duty_type";
    /// Description column
    pub const DUTY_DESCRIPTION: &str = "duty_description";
    /// Priority column
    pub const PRIORITY: &str = "priority";
    /// Required equipment column
    pub const REQUIRED_EQUIPMENT: &str = "required_equipment";
    /// Required training column
    pub const REQUIRED_TRAINING: &str = "required_training";
    /// Notes column
    pub const NOTES: &str = "notes";
    /// Creating admin column
    pub const CREATED_BY: &str = "created_by";
    /// Creation timestamp column
    pub const CREATED_AT: &str = "created_at";
}

/// Volunteer responses to shifts
pub mod shift_confirmations {
    /// Table name
    pub const TABLE: &str = "shift_confirmations";
    /// Primary key column
    pub const ID: &str = "id";
    /// Shift column
    pub const SHIFT_ID: &str = "shift_id";
    /// Volunteer column
    pub const VOLUNTEER_ID: &str = "volunteer_id";
    /// Response status column
    pub const STATUS: &str = "status";
    /// Response notes column
    pub const NOTES: &str = "notes";
    /// Response timestamp column
    pub const RESPONDED_AT: &str = "responded_at";
}

/// Audit trail of admin changes to shifts
pub mod shift_change_requests {
    /// Table name
    pub const TABLE: &str = "shift_change_requests";
    /// Primary key column
    pub const ID: &str = "id";
    /// Shift column
    pub const SHIFT_ID: &str = "shift_id";
    /// Volunteer column
    pub const VOLUNTEER_ID: &str = "volunteer_id";
    /// Request type column (swap, other)
    pub const REQUEST_TYPE: &str = "request_type";
    /// Request details column
    pub const REQUEST_DETAILS: &str = "request_details";
    /// Status column
    pub const STATUS: &str = "status";
    /// Reviewing admin column
    pub const REVIEWED_BY: &str = "reviewed_by";
    /// Review timestamp column
    pub const REVIEWED_AT: &str = "reviewed_at";
    /// Creation timestamp column
    pub const CREATED_AT: &str = "created_at";
}

/// Attendance logs table schema
pub mod attendance_logs {
    /// Table name
    pub const TABLE: &str = "attendance_logs";
    /// Primary key column
    pub const ID: &str = "id";
    /// Volunteer column
    pub const VOLUNTEER_ID: &str = "volunteer_id";
    /// Employee column for user shifts
    pub const USER_ID: &str = "user_id";
    /// Shift column
    pub const SHIFT_ID: &str = "shift_id";
    /// Date column
    pub const SHIFT_DATE: &str = "shift_date";
    /// Check-in timestamp column
    pub const CHECK_IN: &str = "check_in";
    /// Check-out timestamp column
    pub const CHECK_OUT: &str = "check_out";
    /// Attendance status column
    pub const ATTENDANCE_STATUS: &str = "attendance_status";
    /// Worked hours column
    pub const TOTAL_HOURS: &str = "total_hours";
    /// Overtime hours column
    pub const OVERTIME_HOURS: &str = "overtime_hours";
    /// Notes column
    pub const NOTES: &str = "notes";
    /// Verifying admin column
    pub const VERIFIED_BY: &str = "verified_by";
    /// Verification timestamp column
    pub const VERIFIED_AT: &str = "verified_at";
    /// Creation timestamp column
    pub const CREATED_AT: &str = "created_at";
    /// Last update timestamp column
    pub const UPDATED_AT: &str = "updated_at";
}

/// In-app notifications table schema
pub mod notifications {
    /// Table name
    pub const TABLE: &str = "notifications";
    /// Primary key column
    pub const ID: &str = "id";
    /// Recipient user column
    pub const USER_ID: &str = "user_id";
    /// Notification type column
    pub const KIND: &str = "type";
    /// Title column
    pub const TITLE: &str = "title";
    /// Message column
    pub const MESSAGE: &str = "message";
    /// Related record column
    pub const RELATED_ID: &str = "related_id";
    /// Related record type column
    pub const RELATED_TYPE: &str = "related_type";
    /// Read flag column
    pub const IS_READ: &str = "is_read";
    /// Creation timestamp column
    pub const CREATED_AT: &str = "created_at";
}

/// Outbound SMS log table schema
pub mod sms_logs {
    /// Table name
    pub const TABLE: &str = "sms_logs";
    /// Primary key column
    pub const ID: &str = "id";
    /// Recipient phone number column
    pub const RECIPIENT: &str = "recipient";
    /// Message body column
    pub const MESSAGE: &str = "message";
    /// Delivery status column
    pub const STATUS: &str = "status";
    /// Send timestamp column
    pub const SENT_AT: &str = "sent_at";
}
