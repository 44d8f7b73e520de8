/// Abstract call control events exchanged with the application.
/// The first block maps one-to-one onto Q.931 messages, the rest are raised by the stack itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Event {
    Proceeding,
    Alerting,
    Progress,
    Setup,
    Connect,
    SetupAcknowledge,
    ConnectAcknowledge,
    UserInformation,
    SuspendReject,
    ResumeReject,
    Hold,
    Suspend,
    Resume,
    HoldAcknowledge,
    SuspendAcknowledge,
    ResumeAcknowledge,
    HoldReject,
    Retrieve,
    RetrieveAcknowledge,
    RetrieveReject,
    Disconnect,
    Restart,
    Release,
    ReleaseComplete,
    Facility,
    Notify,
    StatusEnquiry,
    Information,
    Status,
    Timeout,

    /// Call context was wiped, the application must forget it
    CleanUp,
    DtmfTone,
    /// The layer-3 id of a call changed
    NewL3Id,
    /// A call context moved to a different pool slot
    NewBc,
    /// The peer assigned a B-channel to a call that had none
    NewChannel,
    BchanData,
    BchanActivated,
    BchanError,
    #[default]
    Nothing,
    Unknown,
}

impl Event {
    /// Name as used in logs and traces
    pub fn name(self) -> &'static str {
        match self {
            Event::Proceeding => "PROCEEDING",
            Event::Alerting => "ALERTING",
            Event::Progress => "PROGRESS",
            Event::Setup => "SETUP",
            Event::Connect => "CONNECT",
            Event::SetupAcknowledge => "SETUP_ACKNOWLEDGE",
            Event::ConnectAcknowledge => "CONNECT_ACKNOWLEDGE",
            Event::UserInformation => "USER_INFORMATION",
            Event::SuspendReject => "SUSPEND_REJECT",
            Event::ResumeReject => "RESUME_REJECT",
            Event::Hold => "HOLD",
            Event::Suspend => "SUSPEND",
            Event::Resume => "RESUME",
            Event::HoldAcknowledge => "HOLD_ACKNOWLEDGE",
            Event::SuspendAcknowledge => "SUSPEND_ACKNOWLEDGE",
            Event::ResumeAcknowledge => "RESUME_ACKNOWLEDGE",
            Event::HoldReject => "HOLD_REJECT",
            Event::Retrieve => "RETRIEVE",
            Event::RetrieveAcknowledge => "RETRIEVE_ACKNOWLEDGE",
            Event::RetrieveReject => "RETRIEVE_REJECT",
            Event::Disconnect => "DISCONNECT",
            Event::Restart => "RESTART",
            Event::Release => "RELEASE",
            Event::ReleaseComplete => "RELEASE_COMPLETE",
            Event::Facility => "FACILITY",
            Event::Notify => "NOTIFY",
            Event::StatusEnquiry => "STATUS_ENQUIRY",
            Event::Information => "INFORMATION",
            Event::Status => "STATUS",
            Event::Timeout => "TIMEOUT",
            Event::CleanUp => "CLEAN_UP",
            Event::DtmfTone => "DTMF_TONE",
            Event::NewL3Id => "NEW_L3ID",
            Event::NewBc => "NEW_BC",
            Event::NewChannel => "NEW_CHANNEL",
            Event::BchanData => "BCHAN_DATA",
            Event::BchanActivated => "BCHAN_ACTIVATED",
            Event::BchanError => "BCHAN_ERROR",
            Event::Nothing => "NOTHING",
            Event::Unknown => "UNKNOWN",
        }
    }

    /// True for events that only exist inside the stack and have no Q.931 message
    pub fn is_internal(self) -> bool {
        matches!(
            self,
            Event::CleanUp
                | Event::DtmfTone
                | Event::NewL3Id
                | Event::NewBc
                | Event::NewChannel
                | Event::BchanData
                | Event::BchanActivated
                | Event::BchanError
                | Event::Nothing
                | Event::Unknown
        )
    }
}

impl core::fmt::Display for Event {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}
