use cfgdrift_core::model::VendorTag;
use cfgdrift_engine::{DeviceJob, EngineConfig, Pipeline, RawBackup};
use chrono::{DateTime, TimeZone, Utc};

#[allow(dead_code)]
pub const EDGE_BEFORE: &str = "\
hostname edge-1
!
interface GigabitEthernet0/1
 description uplink
 switchport trunk allowed vlan 10,20
!
ip access-list extended EDGE-IN
 10 permit tcp host 192.0.2.10 any eq 22
 20 permit tcp host 192.0.2.11 any eq 443
 30 deny ip any any
!
ntp server 192.0.2.1
ntp server 192.0.2.2
end
";

/// Adds VLAN 30 to the trunk
#[allow(dead_code)]
pub const EDGE_AFTER_VLAN: &str = "\
hostname edge-1
!
interface GigabitEthernet0/1
 description uplink
 switchport trunk allowed vlan 10,20,30
!
ip access-list extended EDGE-IN
 10 permit tcp host 192.0.2.10 any eq 22
 20 permit tcp host 192.0.2.11 any eq 443
 30 deny ip any any
!
ntp server 192.0.2.1
ntp server 192.0.2.2
end
";

/// Swaps the first two ACL entries and reorders NTP servers
#[allow(dead_code)]
pub const EDGE_AFTER_REORDER: &str = "\
hostname edge-1
!
interface GigabitEthernet0/1
 description uplink
 switchport trunk allowed vlan 10,20
!
ip access-list extended EDGE-IN
 10 permit tcp host 192.0.2.11 any eq 443
 20 permit tcp host 192.0.2.10 any eq 22
 30 deny ip any any
!
ntp server 192.0.2.2
ntp server 192.0.2.1
end
";

#[allow(dead_code)]
pub const JUNOS_OK: &str = "system {\n    host-name core-1;\n}\n";

#[allow(dead_code)]
pub const JUNOS_BROKEN: &str = "system {\n    host-name core-1;\n";

/// Capture timestamp on the given day of April 2026
#[allow(dead_code)]
pub fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 4, day, 1, 30, 0).unwrap()
}

#[allow(dead_code)]
pub fn job(device_id: &str, vendor: VendorTag, before: &str, after: &str) -> DeviceJob {
    DeviceJob {
        device_id: device_id.to_string(),
        vendor,
        before: RawBackup::new(before, at(1)),
        after: RawBackup::new(after, at(2)),
    }
}

#[allow(dead_code)]
pub fn ios_job(device_id: &str, before: &str, after: &str) -> DeviceJob {
    job(device_id, VendorTag::CiscoIos, before, after)
}

#[allow(dead_code)]
pub fn pipeline(config: EngineConfig) -> Pipeline {
    Pipeline::from_config(config).unwrap()
}
