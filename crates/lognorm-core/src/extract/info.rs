//! Label-derived sub-records shared by the text-parsing strategies.

use crate::labels;
use crate::types::{
    AgentInfo, ContainerImage, ContainerInfo, HostInfo, IntermediateRecord, OrganizationInfo,
    ServiceInfo,
};

use super::Context;

/// Producer identity keying the timestamp layout cache:
/// `service_name` (else `job_name`) + `@` + `service_version`.
pub fn producer_identity(record: &IntermediateRecord) -> String {
    let name = record
        .label(labels::SERVICE_NAME)
        .or_else(|| record.label(labels::JOB_NAME))
        .unwrap_or(labels::UNKNOWN);
    let version = record.label(labels::SERVICE_VERSION).unwrap_or_default();
    format!("{name}@{version}")
}

fn owned(record: &IntermediateRecord, key: &str) -> Option<String> {
    record.label(key).map(str::to_string)
}

pub(super) fn container(cx: &mut Context<'_>) {
    let record = cx.record;
    let info = ContainerInfo {
        id: owned(record, labels::CONTAINER_ID),
        name: owned(record, labels::CONTAINER_NAME),
        image: owned(record, labels::CONTAINER_IMAGE).map(|name| ContainerImage { name }),
    };
    if info != ContainerInfo::default() {
        cx.entry.container = Some(info);
    }
}

pub(super) fn agent(cx: &mut Context<'_>) {
    let record = cx.record;
    let info = AgentInfo {
        name: owned(record, labels::AGENT_NAME),
        kind: owned(record, labels::SOURCE),
        version: owned(record, labels::AGENT_VERSION),
    };
    if info != AgentInfo::default() {
        cx.entry.agent = Some(info);
    }
}

pub(super) fn host(cx: &mut Context<'_>) {
    let record = cx.record;
    let info = HostInfo {
        name: owned(record, labels::HOST_NAME),
        id: owned(record, labels::HOST_ID),
    };
    if info != HostInfo::default() {
        cx.entry.host = Some(info);
    }
}

pub(super) fn organization(cx: &mut Context<'_>) {
    let record = cx.record;
    let info = OrganizationInfo {
        id: owned(record, labels::ORGANIZATION_ID),
        name: owned(record, labels::ORGANIZATION_NAME),
    };
    if info != OrganizationInfo::default() {
        cx.entry.organization = Some(info);
    }
}

pub(super) fn service(cx: &mut Context<'_>) {
    let record = cx.record;
    let info = ServiceInfo {
        name: owned(record, labels::SERVICE_NAME),
        version: owned(record, labels::SERVICE_VERSION),
        environment: owned(record, labels::SERVICE_ENVIRONMENT),
        kind: owned(record, labels::JOB_TYPE),
    };
    if info != ServiceInfo::default() {
        cx.entry.service = Some(info);
    }
}
