//! Static tables which map human-readable alert classifications, channels,
//! and criteria onto the numeric codes expected by the CommServe.
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator};

/// Criteria id used by every custom-rule (SQL query backed) alert.
pub const CUSTOM_ALERT_CRITERIA: u32 = 75;

/// Criteria ids which accept an auxiliary params list.
pub const PARAMS_LIST_CRITERIA: &[u32] = &[
    1, 2, 3, 4, 5, 7, 8, 10, 11, 12, 13, 14, 16, 17, 18, 19, 20, 21, 22, 26, 27, 28, 29, 30, 31,
    32, 38, 39, 46, 47, 51, 52, 53, 54, 55, 57, 58, 60, 63, 65, 66, 67, 68, 69, 70, 71, 72, 73, 74,
];

/// Category of an alert, which scopes the set of valid alert types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum Category {
    #[serde(rename = "Configuration")]
    Configuration,
    #[serde(rename = "Job Management")]
    JobManagement,
    #[serde(rename = "Media Management")]
    MediaManagement,
    #[serde(rename = "Operation")]
    Operation,
    #[serde(rename = "Software Updates")]
    SoftwareUpdates,
    #[serde(rename = "Custom Rules")]
    CustomRules,
}

impl Category {
    pub fn id(&self) -> u32 {
        match self {
            Category::Configuration => 2,
            Category::JobManagement => 1,
            Category::MediaManagement => 3,
            Category::Operation => 8,
            Category::SoftwareUpdates => 5,
            Category::CustomRules => 9,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Category::Configuration => "Configuration",
            Category::JobManagement => "Job Management",
            Category::MediaManagement => "Media Management",
            Category::Operation => "Operation",
            Category::SoftwareUpdates => "Software Updates",
            Category::CustomRules => "Custom Rules",
        }
    }

    /// Parse a category from its display name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Category> {
        Category::iter().find(|c| c.name().eq_ignore_ascii_case(name.trim()))
    }

    /// Alert types of this category and their numeric codes.
    pub fn types(&self) -> &'static [(&'static str, u32)] {
        match self {
            Category::Configuration => &[
                ("Client Group", 59),
                ("Clients", 10),
                ("Commcell", 12),
                ("Library", 16),
                ("License", 60),
                ("MediaAgents", 13),
                ("Schedules", 14),
                ("Storage Policy", 15),
            ],
            Category::JobManagement => &[
                ("Data Aging", 1),
                ("Data Classification", 27),
                ("Auxiliary Copy", 2),
                ("Data Protection", 3),
                ("Backup Copy Workflow", 61),
                ("Continuous Data Replication", 28),
                ("Data Verification", 6),
                ("DeDup DB Reconstruction", 55),
                ("Disaster Recovery Backup", 5),
                ("Information Management", 53),
                ("Media Erase", 9),
                ("Media Inventory", 7),
                ("Media Refreshing", 54),
                ("Offline Content Indexing", 29),
                ("Report", 52),
                ("Virtualize Me", 64),
                ("Workflow", 63),
            ],
            Category::MediaManagement => &[
                ("Device Status", 21),
                ("Library Management", 17),
                ("Vault Tracker", 18),
            ],
            Category::Operation => &[
                ("Event Viewer Events", 58),
                ("CommServe LiveSync", 74),
                ("Admin Alert", 75),
            ],
            Category::SoftwareUpdates => &[
                ("Download Software", 19),
                ("Install Updates", 20),
                ("Updates Available To Download", 24),
            ],
            Category::CustomRules => &[("all", 65)],
        }
    }

    /// Resolve the numeric code of the named alert type within this category.
    pub fn type_id(&self, type_name: &str) -> Option<u32> {
        self.types()
            .iter()
            .find(|(name, _)| *name == type_name)
            .map(|(_, id)| *id)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A channel through which the CommServe delivers alert notifications.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter,
)]
pub enum NotificationChannel {
    #[serde(rename = "Email")]
    Email,
    #[serde(rename = "Snmp")]
    Snmp,
    #[serde(rename = "Event Viewer")]
    EventViewer,
    #[serde(rename = "Save To Disk")]
    SaveToDisk,
    #[serde(rename = "Rss Feeds")]
    Rss,
    #[serde(rename = "Console Alerts")]
    Console,
    #[serde(rename = "Scom")]
    Scom,
}

impl NotificationChannel {
    /// Numeric wire code of the channel. Codes are distinct bits, and the
    /// alert's `notifType` is their sum.
    pub fn code(&self) -> u32 {
        match self {
            NotificationChannel::Email => 1,
            NotificationChannel::Snmp => 4,
            NotificationChannel::EventViewer => 8,
            NotificationChannel::SaveToDisk => 512,
            NotificationChannel::Rss => 1024,
            NotificationChannel::Console => 8192,
            NotificationChannel::Scom => 32768,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            NotificationChannel::Email => "Email",
            NotificationChannel::Snmp => "Snmp",
            NotificationChannel::EventViewer => "Event Viewer",
            NotificationChannel::SaveToDisk => "Save To Disk",
            NotificationChannel::Rss => "Rss Feeds",
            NotificationChannel::Console => "Console Alerts",
            NotificationChannel::Scom => "Scom",
        }
    }

    pub fn from_name(name: &str) -> Option<NotificationChannel> {
        NotificationChannel::iter().find(|c| c.name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn from_code(code: u32) -> Option<NotificationChannel> {
        NotificationChannel::iter().find(|c| c.code() == code)
    }

    /// Whether the server renders this channel's message from a rich HTML template.
    pub fn supports_html(&self) -> bool {
        matches!(
            self,
            NotificationChannel::Email
                | NotificationChannel::SaveToDisk
                | NotificationChannel::Console
        )
    }
}

impl std::fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Human readable name of a criteria id, if it's a known built-in criteria.
pub fn criteria_name(id: u32) -> Option<&'static str> {
    CRITERIA_NAMES
        .binary_search_by_key(&id, |(id, _)| *id)
        .ok()
        .map(|index| CRITERIA_NAMES[index].1)
}

/// Map criteria ids onto their names. Unknown ids map to `None`.
pub fn criteria_names(ids: &[u32]) -> Vec<Option<&'static str>> {
    ids.iter().map(|id| criteria_name(*id)).collect()
}

// Sorted by id.
const CRITERIA_NAMES: &[(u32, &str)] = &[
    (1, "Succeeded"),
    (2, "Alert every 2 attempts (Phase failures)"),
    (3, "Failed"),
    (4, "Skipped"),
    (5, "Delayed by 1 Hrs"),
    (6, "List Media"),
    (7, "Initiated"),
    (8, "Rolled Back"),
    (9, "Media Needs Import"),
    (10, "Media Handling Required"),
    (11, "Media Picked up"),
    (12, "Media Reached Destination"),
    (13, "Media Returned to Source"),
    (14, "Job Activity"),
    (15, "ASR Backup Has occured."),
    (16, "Properties Modified"),
    (17, "Alert Modified"),
    (18, "Disk Space Low"),
    (19, "Force deconfigured"),
    (20, "Library went Offline"),
    (21, "Scheduler Changes"),
    (22, "Insufficient Storage"),
    (23, "Media Handling Errors"),
    (24, "Media Handling Required"),
    (25, "Media Mount and Usage Errors"),
    (26, "Maintenance Required"),
    (27, "Maintenance Occured"),
    (28, "User overwrite of Media"),
    (29, "Drive went Offline"),
    (30, "MediaAgent went Offline"),
    (31, "Mountpath went Offline"),
    (32, "Alert every 2 attempts (Network failures)"),
    (33, "Exchange Journal Mailboxes 10000 Message Count Exceeded"),
    (34, "Job Results Folder Low Space"),
    (35, "Index Cache Folder Low Space"),
    (38, "Updates Available"),
    (39, "Release Upgrade Required"),
    (40, "Updates Required"),
    (41, "Media Ready in CAP Alert"),
    (42, "Log file reached high watermark"),
    (43, "Log file volume reached low watermark"),
    (44, "No log play activity"),
    (45, "No log transfer activity"),
    (46, "No Data Protection"),
    (47, "Classification Failed"),
    (48, "No log transfer activity"),
    (49, "Virtual Servers Added"),
    (50, "V2 upgraded to V3"),
    (51, "Media Recalled"),
    (52, "Increase in Data size by 10 %"),
    (53, "Decrease in Data size by 10 %"),
    (54, "Job Started"),
    (55, "Alert every 3 failed login attempts"),
    (56, "Auxilary copy fallen behind alert"),
    (57, "Job Completed with Errors"),
    (58, "Alert Commserver license expires within 30 days"),
    (60, "Alert Commserver license expires within 99 days"),
    (61, "Log monitoring"),
    (62, "Simpana Event monitoring"),
    (63, "Non-encrypted media exported"),
    (64, "Content Index data fallen behind alert"),
    (65, "No Backup for last 3 Days"),
    (66, "Certificate for client expired/revoked"),
    (67, "Job exceeded running time"),
    (68, "Failed files count exceeded threshold"),
    (69, "Failed files Percent exceeded threshold"),
    (70, "DDB Store got corrupted"),
    (71, "Backup for subclient failed consecutively for 3 attempts"),
    (72, "DDB disk space low"),
    (73, "Alert when jobs in pending state exceed 30 percent or count of 15"),
    (74, "Data backed up exceeds 5 GB"),
    (75, "Custom Alert"),
    (76, "Job Commmitted"),
    (77, "Disk space low for Job results directory"),
    (78, "Disk Space low for Index Cache"),
    (79, "Disk Space low for Galaxy directory"),
    (80, "Quota exceeded"),
    (81, "Quota reaching threshold"),
    (82, "Quota validation failed"),
    (83, "Edge drive/share operations"),
    (84, "DDB went Offline"),
    (85, "Increase in object count by 10 percent"),
    (86, "Failover started"),
    (87, "Failover activity"),
    (88, "Failover completed"),
    (89, "Failover failed"),
    (90, "Production Commserv is not reachable"),
    (91, "Production Commserv is not running"),
    (92, "Passive node is not reachable"),
    (93, "Anomaly in events"),
    (94, "Runtime anomaly in jobs"),
    (95, "Anomaly in number of pending jobs"),
    (96, "Anomaly in number of failed jobs"),
    (98, "File system Quota Exceeded"),
    (99, "File system Quota reaching threshold"),
    (100, "File system quota validation failed"),
    (101, "Job activity anomaly"),
    (102, "Anomaly in number of succeeded jobs"),
    (103, "Alert when client is offline for 15 Minutes"),
    (104, "Anomaly in DDB pruning"),
    (105, "Smart MA state Management"),
    (106, "Job succeeded with warnings"),
    (200, "Trigger Report (need to hide!)"),
];

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_category_lookups() {
        assert_eq!(Category::from_name("job management"), Some(Category::JobManagement));
        assert_eq!(Category::from_name("Custom Rules"), Some(Category::CustomRules));
        assert_eq!(Category::from_name("Jobs"), None);

        assert_eq!(Category::JobManagement.type_id("Data Protection"), Some(3));
        assert_eq!(Category::JobManagement.type_id("Clients"), None);
        assert_eq!(Category::CustomRules.type_id("all"), Some(65));
    }

    #[test]
    fn test_channel_codes() {
        let codes: Vec<u32> = NotificationChannel::iter().map(|c| c.code()).collect();
        assert_eq!(codes, vec![1, 4, 8, 512, 1024, 8192, 32768]);

        for channel in NotificationChannel::iter() {
            assert_eq!(NotificationChannel::from_code(channel.code()), Some(channel));
        }
        assert_eq!(
            NotificationChannel::from_name("rss feeds"),
            Some(NotificationChannel::Rss)
        );

        let html: Vec<_> = NotificationChannel::iter()
            .filter(NotificationChannel::supports_html)
            .map(|c| c.code())
            .collect();
        assert_eq!(html, vec![1, 512, 8192]);
    }

    #[test]
    fn test_criteria_names_are_sorted() {
        assert!(CRITERIA_NAMES.windows(2).all(|w| w[0].0 < w[1].0));

        assert_eq!(
            criteria_names(&[3, 75, 97]),
            vec![Some("Failed"), Some("Custom Alert"), None]
        );
    }
}
