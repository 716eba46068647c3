use casbin::{
    CoreApi,
    DefaultModel,
    MemoryAdapter,
    MgmtApi,
};
use jobcore::{
    perms::{
        PERM_ANY,
        genpolicy::GrantPolicy,
    },
    traits::Enforcer,
};

use crate::{
    builder::{Kind, Builder},
    error::Error,
};

/// The casbin model for job scoped grants.
///
/// Subjects are users (`u:<id>`), which are grouped into roles
/// (`r:<id>`); the superuser role is granted everything.
const DEFAULT_MODEL: &str = "\
[request_definition]
r = sub, cat, act

[policy_definition]
p = sub, cat, act

[role_definition]
g = _, _

[policy_effect]
e = some(where (p.eft == allow))

[matchers]
m = g(r.sub, p.sub) && keyMatch(r.cat, p.cat) && keyMatch(r.act, p.act)
";

const SUPERUSER_ROLE: &str = "superuser";

#[derive(Clone, Debug, Default)]
pub struct CasbinBuilder {
    pub(crate) default_model: Box<str>,
}

impl From<CasbinBuilder> for Builder {
    fn from(builder: CasbinBuilder) -> Self {
        Self {
            kind: Kind::Casbin(builder),
        }
    }
}

impl CasbinBuilder {
    pub fn new() -> Self {
        Self {
            default_model: DEFAULT_MODEL.into(),
        }
    }

    pub fn default_model(mut self, val: &str) -> Self {
        self.default_model = val.into();
        self
    }

    pub async fn build_with_policy(
        &self,
        policy: GrantPolicy,
    ) -> Result<CasbinEnforcer, casbin::Error> {
        CasbinEnforcer::new(&self.default_model, policy).await
    }
}

pub struct CasbinEnforcer {
    subject: String,
    enforcer: casbin::Enforcer,
}

impl CasbinEnforcer {
    pub async fn new(
        model: &str,
        policy: GrantPolicy,
    ) -> Result<Self, casbin::Error> {
        let m = DefaultModel::from_str(model).await?;
        let a = MemoryAdapter::default();
        let mut enforcer = casbin::Enforcer::new(m, a).await?;
        let subject = Self::to_subject(policy.identity.user_id);

        let mut groupings = policy.identity.roles.iter()
            .map(|role_id| vec![subject.clone(), Self::to_role(*role_id)])
            .collect::<Vec<_>>();
        let mut policies = policy.permissions.iter()
            .filter(|perm| policy.identity.holds_role(perm.role_id))
            .map(|perm| vec![
                Self::to_role(perm.role_id),
                perm.category.clone(),
                perm.name.clone(),
            ])
            .collect::<Vec<_>>();
        if policy.identity.superuser {
            log::debug!("new CasbinEnforcer granting {subject} the superuser role");
            groupings.push(vec![subject.clone(), SUPERUSER_ROLE.to_string()]);
            policies.push(vec![SUPERUSER_ROLE.to_string(), "*".to_string(), "*".to_string()]);
        }

        let n = policies.len();
        if !policies.is_empty() {
            enforcer.add_named_policies("p", policies).await?;
        }
        if !groupings.is_empty() {
            enforcer.add_named_grouping_policies("g", groupings).await?;
        }
        log::debug!("new CasbinEnforcer set up with {n} policies");
        Ok(Self { subject, enforcer })
    }

    fn to_subject(user_id: i64) -> String {
        format!("u:{user_id}")
    }

    fn to_role(role_id: i64) -> String {
        format!("r:{role_id}")
    }

    fn casbin_enforce(
        &self,
        category: &str,
        name: &str,
    ) -> Result<bool, casbin::Error> {
        self.enforcer.enforce((
            self.subject.as_str(),
            category,
            name,
        ))
    }
}

impl Enforcer for CasbinEnforcer {
    type Error = Error;

    fn can(&self, category: &str, name: &str) -> Result<bool, Self::Error> {
        if name == PERM_ANY {
            return Ok(true);
        }
        Ok(self.casbin_enforce(category, name)?)
    }
}

#[cfg(test)]
mod test {
    use jobcore::{
        identity::CallerIdentity,
        role::RolePermission,
    };
    use crate::simple::PolicyEnforcer;
    use super::*;

    fn grant(role_id: i64, category: &str, name: &str) -> RolePermission {
        RolePermission {
            role_id,
            permission_id: 0,
            category: category.to_string(),
            name: name.to_string(),
            attributes: Default::default(),
        }
    }

    fn policy(superuser: bool) -> GrantPolicy {
        GrantPolicy::new(
            CallerIdentity::new(1, "ambulance", 2)
                .roles([1, 2])
                .superuser(superuser),
            vec![
                grant(1, "Conduct", "ListEntries"),
                grant(2, "Conduct", "CreateEntry"),
                grant(3, "Conduct", "DeleteEntry"),
                grant(1, "JobsService", "ListColleagues"),
            ],
        )
    }

    #[tokio::test]
    async fn empty() -> anyhow::Result<()> {
        let enforcer = CasbinBuilder::new()
            .build_with_policy(GrantPolicy::default())
            .await?;
        assert!(!enforcer.can("Conduct", "ListEntries")?);
        assert!(enforcer.can("Conduct", PERM_ANY)?);
        Ok(())
    }

    #[tokio::test]
    async fn matches_policy_enforcer() -> anyhow::Result<()> {
        for superuser in [false, true] {
            let casbin = Builder::from(CasbinBuilder::new())
                .build_with_policy(policy(superuser))
                .await?;
            let pe = Builder::new()
                .build_with_policy(policy(superuser))
                .await?;
            for (category, name) in [
                ("Conduct", "ListEntries"),
                ("Conduct", "CreateEntry"),
                ("Conduct", "DeleteEntry"),
                ("Conduct", "UpdateEntry"),
                ("JobsService", "ListColleagues"),
                ("JobsService", "Any"),
                ("Superuser", "CanBeSuperuser"),
            ] {
                assert_eq!(
                    casbin.can(category, name)?,
                    pe.can(category, name)?,
                    "{category}.{name} (superuser: {superuser})",
                );
            }
        }

        let pe = PolicyEnforcer::from(policy(false));
        assert!(!pe.can("Conduct", "DeleteEntry")?);
        Ok(())
    }
}
