use jobcore::{
    perms::{
        Attr,
        PermissionDef,
    },
    platform::PlatformConnector,
};
use jobdb_sqlite::SqliteBackend;
use jobperms::{
    platform::{
        Builder,
        Platform,
    },
    Registry,
};

/// The permissions of a small conduct register and a colleague listing.
pub fn sample_permission_defs() -> Vec<PermissionDef> {
    vec![
        PermissionDef::new("Conduct", "ListEntries")
            .attr(Attr::string_list(
                "Access",
                ["Own", "Same_Rank", "Lower_Rank", "Any"],
                ["Own"],
            )),
        PermissionDef::new("Conduct", "CreateEntry"),
        PermissionDef::new("Conduct", "DeleteEntry"),
        PermissionDef::new("JobsService", "ListColleagues"),
        PermissionDef::new("JobsService", "GetColleague")
            .attr(Attr::job_grade_list("Jobs")),
        // the grades of the ambulance one may look up
        PermissionDef::new("JobsService", "GetUser.ambulance.1"),
        PermissionDef::new("JobsService", "GetUser.ambulance.3"),
        PermissionDef::new("JobsService", "GetUser.police.0"),
        PermissionDef::new("Qualifications", "ListQualifications")
            .attr(Attr::job_list("Jobs")),
        PermissionDef::new("Superuser", "CanBeSuperuser"),
    ]
}

pub fn sample_registry() -> anyhow::Result<Registry> {
    Ok(Registry::new().with(sample_permission_defs())?)
}

pub async fn create_sqlite_backend() -> anyhow::Result<SqliteBackend> {
    SqliteBackend::perms("sqlite::memory:".into())
        .await
        .map_err(anyhow::Error::from_boxed)
}

/// A platform backed by a fresh in memory database with the sample
/// permissions already stored.
pub async fn create_sqlite_platform() -> anyhow::Result<Platform> {
    let platform = Builder::new()
        .perms_platform(create_sqlite_backend().await?)
        .registry(sample_registry()?)
        .build()?;
    platform.sync_permissions().await?;
    Ok(platform)
}

pub async fn permission_id(
    platform: &Platform,
    guard_name: &str,
) -> anyhow::Result<i64> {
    platform.list_permissions().await?
        .into_iter()
        .find(|perm| perm.guard_name == guard_name)
        .map(|perm| perm.id)
        .ok_or_else(|| anyhow::anyhow!("no permission {guard_name}"))
}
