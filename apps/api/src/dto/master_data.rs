use serde::{Deserialize, Serialize};
use ts_rs::TS;
use veritrail_core::AppResult;
use veritrail_domain::{
    MasterDataList, MasterDataListInput, MasterDataValueInput, SelectionMode,
};

/// API representation of one master data value.
#[derive(Debug, Serialize, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/master-data-value-payload.ts"
)]
pub struct MasterDataValuePayload {
    /// Stable machine value.
    pub value: String,
    /// Human-readable label.
    pub label: String,
    /// Position within the list.
    pub sort_order: i32,
    /// Whether the value is offered for new selections.
    pub active: bool,
}

/// API representation of a master data list.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/master-data-list-response.ts"
)]
pub struct MasterDataListResponse {
    /// Stable machine name.
    pub name: String,
    /// Human-readable list title.
    pub display_name: String,
    /// Selection cardinality, single or multi.
    pub selection_mode: String,
    /// Member values ordered by sort order.
    pub values: Vec<MasterDataValuePayload>,
}

impl From<MasterDataList> for MasterDataListResponse {
    fn from(value: MasterDataList) -> Self {
        Self {
            name: value.name().to_owned(),
            display_name: value.display_name().as_str().to_owned(),
            selection_mode: value.selection_mode().as_str().to_owned(),
            values: value
                .values()
                .iter()
                .map(|member| MasterDataValuePayload {
                    value: member.value().to_owned(),
                    label: member.label().as_str().to_owned(),
                    sort_order: member.sort_order(),
                    active: member.active(),
                })
                .collect(),
        }
    }
}

/// Incoming payload for saving a master data list.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../../packages/api-types/src/generated/save-master-data-list-request.ts"
)]
pub struct SaveMasterDataListRequest {
    /// Stable machine name.
    pub name: String,
    /// Human-readable list title.
    pub display_name: String,
    /// Selection cardinality, single or multi.
    pub selection_mode: String,
    /// Member values.
    #[serde(default)]
    pub values: Vec<MasterDataValuePayload>,
}

impl SaveMasterDataListRequest {
    /// Validates the payload into a domain list.
    pub fn into_list(self) -> AppResult<MasterDataList> {
        let selection_mode: SelectionMode = self.selection_mode.parse()?;
        MasterDataList::new(MasterDataListInput {
            name: self.name,
            display_name: self.display_name,
            selection_mode,
            values: self
                .values
                .into_iter()
                .map(|member| MasterDataValueInput {
                    value: member.value,
                    label: member.label,
                    sort_order: member.sort_order,
                    active: member.active,
                })
                .collect(),
        })
    }
}
