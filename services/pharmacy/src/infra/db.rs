use std::sync::Arc;

use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, SqlErr, TransactionError, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use tokio::sync::Mutex;

use rxdesk_domain::id::UserId;
use rxdesk_domain::user::UserRole;
use rxdesk_pharmacy_schema::{doctors, partners, patients, pharmacy_config, staff, users};

use crate::domain::repository::{PharmacyConfigRepository, UserRepository};
use crate::domain::types::{
    Account, Credentials, DoctorDetails, EMAIL_TAKEN, EMPLOYEE_ID_TAKEN, LICENSE_NUMBER_TAKEN,
    NewUser, PartnerDetails, PatientDetails, PharmacyConfigRecord, PharmacySettings, RoleDetails,
    StaffDetails, UserChanges, UserRecord, ensure_profit_share_fits,
};
use crate::error::PharmacyServiceError;

/// Failure inside a write transaction: either the store or a business rule.
#[derive(Debug, thiserror::Error)]
enum WriteError {
    #[error(transparent)]
    Db(#[from] DbErr),
    #[error("{0}")]
    Rejected(PharmacyServiceError),
}

fn write_failure(err: TransactionError<WriteError>, context: &'static str) -> PharmacyServiceError {
    match err {
        TransactionError::Transaction(WriteError::Rejected(e)) => e,
        TransactionError::Transaction(WriteError::Db(e)) | TransactionError::Connection(e) => {
            store_failure(e, context)
        }
    }
}

/// Unique violations become the same `Conflict` the pre-checks produce;
/// anything else is internal.
fn store_failure(err: DbErr, context: &'static str) -> PharmacyServiceError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = err.sql_err() {
        if let Some(message) = unique_violation_message(&detail) {
            return PharmacyServiceError::Conflict(message.to_owned());
        }
    }
    PharmacyServiceError::Internal(anyhow::Error::new(err).context(context))
}

fn unique_violation_message(detail: &str) -> Option<&'static str> {
    if detail.contains("users.email") {
        Some(EMAIL_TAKEN)
    } else if detail.contains("doctors.license_number") {
        Some(LICENSE_NUMBER_TAKEN)
    } else if detail.contains("staff.employee_id") {
        Some(EMPLOYEE_ID_TAKEN)
    } else {
        None
    }
}

// ── User repository ──────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
    /// Held for every write that can change the partner share total.
    pub partner_writes: Arc<Mutex<()>>,
}

impl UserRepository for DbUserRepository {
    async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Credentials>, PharmacyServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        let Some(model) = model else {
            return Ok(None);
        };
        let password_hash = model.password_hash.clone();
        Ok(Some(Credentials {
            account: account_from_model(model)?,
            password_hash,
        }))
    }

    async fn find_account(&self, id: UserId) -> Result<Option<Account>, PharmacyServiceError> {
        let model = users::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find user by id")?;
        model.map(account_from_model).transpose()
    }

    async fn find_record(&self, id: UserId) -> Result<Option<UserRecord>, PharmacyServiceError> {
        let model = users::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find user by id")?;
        let Some(model) = model else {
            return Ok(None);
        };
        let account = account_from_model(model)?;
        let record = load_record(&self.db, account)
            .await
            .context("load user details")??;
        Ok(Some(record))
    }

    async fn email_exists(&self, email: &str) -> Result<bool, PharmacyServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("check email")?;
        Ok(model.is_some())
    }

    async fn license_number_exists(
        &self,
        license_number: &str,
    ) -> Result<bool, PharmacyServiceError> {
        let model = doctors::Entity::find()
            .filter(doctors::Column::LicenseNumber.eq(license_number))
            .one(&self.db)
            .await
            .context("check license number")?;
        Ok(model.is_some())
    }

    async fn employee_id_exists(&self, employee_id: &str) -> Result<bool, PharmacyServiceError> {
        let model = staff::Entity::find()
            .filter(staff::Column::EmployeeId.eq(employee_id))
            .one(&self.db)
            .await
            .context("check employee id")?;
        Ok(model.is_some())
    }

    async fn total_profit_share(
        &self,
        excluding: Option<UserId>,
    ) -> Result<f64, PharmacyServiceError> {
        let total = sum_profit_share(&self.db, excluding)
            .await
            .context("sum profit shares")?;
        Ok(total)
    }

    async fn create(&self, user: &NewUser) -> Result<UserRecord, PharmacyServiceError> {
        let _partner_guard = match user.details {
            RoleDetails::Partner(_) => Some(self.partner_writes.lock().await),
            _ => None,
        };
        let user = user.clone();
        self.db
            .transaction::<_, UserRecord, WriteError>(move |txn| {
                Box::pin(async move {
                    if let RoleDetails::Partner(ref partner) = user.details {
                        let current = sum_profit_share(txn, None).await?;
                        ensure_profit_share_fits(current, partner.profit_share_percentage)
                            .map_err(WriteError::Rejected)?;
                    }
                    let model = users::ActiveModel {
                        id: Set(user.id.0),
                        email: Set(user.email.clone()),
                        password_hash: Set(user.password_hash.clone()),
                        first_name: Set(user.first_name.clone()),
                        last_name: Set(user.last_name.clone()),
                        phone: Set(user.phone.clone()),
                        role: Set(user.details.role().as_str().to_owned()),
                        is_active: Set(true),
                        created_at: Set(user.created_at),
                        updated_at: Set(user.created_at),
                    }
                    .insert(txn)
                    .await?;
                    let details = insert_details(txn, user.id, &user.details).await?;
                    Ok(UserRecord {
                        account: account_from_model(model).map_err(WriteError::Rejected)?,
                        details,
                    })
                })
            })
            .await
            .map_err(|e| write_failure(e, "create user"))
    }

    async fn list_by_role(&self, role: UserRole) -> Result<Vec<UserRecord>, PharmacyServiceError> {
        let query = users::Entity::find()
            .filter(users::Column::Role.eq(role.as_str()))
            .order_by_desc(users::Column::CreatedAt)
            .order_by_desc(users::Column::Id);
        match role {
            UserRole::Patient => {
                let rows = query
                    .find_also_related(patients::Entity)
                    .all(&self.db)
                    .await
                    .context("list patients")?;
                join_rows(rows, |m| RoleDetails::Patient(patient_details(m)))
            }
            UserRole::Doctor => {
                let rows = query
                    .find_also_related(doctors::Entity)
                    .all(&self.db)
                    .await
                    .context("list doctors")?;
                join_rows(rows, |m| RoleDetails::Doctor(doctor_details(m)))
            }
            UserRole::Pharmacist => {
                let rows = query
                    .find_also_related(staff::Entity)
                    .all(&self.db)
                    .await
                    .context("list staff")?;
                join_rows(rows, |m| RoleDetails::Staff(staff_details(m)))
            }
            UserRole::Partner => {
                let rows = query
                    .find_also_related(partners::Entity)
                    .all(&self.db)
                    .await
                    .context("list partners")?;
                join_rows(rows, |m| RoleDetails::Partner(partner_details(m)))
            }
            UserRole::Admin => {
                let rows = query.all(&self.db).await.context("list admins")?;
                rows.into_iter()
                    .map(|m| {
                        account_from_model(m).map(|account| UserRecord {
                            account,
                            details: RoleDetails::Admin,
                        })
                    })
                    .collect()
            }
        }
    }

    async fn update(
        &self,
        id: UserId,
        changes: &UserChanges,
    ) -> Result<Option<UserRecord>, PharmacyServiceError> {
        let _partner_guard = match changes.profit_share_percentage {
            Some(_) => Some(self.partner_writes.lock().await),
            None => None,
        };
        let changes = changes.clone();
        self.db
            .transaction::<_, Option<UserRecord>, WriteError>(move |txn| {
                Box::pin(async move {
                    let Some(existing) = users::Entity::find_by_id(id.0).one(txn).await? else {
                        return Ok(None);
                    };
                    let role = account_from_model(existing)
                        .map_err(WriteError::Rejected)?
                        .role;

                    let mut am = users::ActiveModel {
                        id: Set(id.0),
                        updated_at: Set(Utc::now()),
                        ..Default::default()
                    };
                    if let Some(ref first_name) = changes.first_name {
                        am.first_name = Set(first_name.clone());
                    }
                    if let Some(ref last_name) = changes.last_name {
                        am.last_name = Set(last_name.clone());
                    }
                    if let Some(ref phone) = changes.phone {
                        am.phone = Set(Some(phone.clone()));
                    }
                    let updated = am.update(txn).await?;

                    update_details(txn, id, role, &changes).await?;

                    let account = account_from_model(updated).map_err(WriteError::Rejected)?;
                    let record = load_record(txn, account)
                        .await?
                        .map_err(WriteError::Rejected)?;
                    Ok(Some(record))
                })
            })
            .await
            .map_err(|e| write_failure(e, "update user"))
    }

    async fn set_active(&self, id: UserId, active: bool) -> Result<bool, PharmacyServiceError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::IsActive, Expr::value(active))
            .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(users::Column::Id.eq(id.0))
            .exec(&self.db)
            .await
            .context("set user active flag")?;
        Ok(result.rows_affected > 0)
    }
}

async fn sum_profit_share<C: ConnectionTrait>(
    conn: &C,
    excluding: Option<UserId>,
) -> Result<f64, DbErr> {
    let mut query = partners::Entity::find();
    if let Some(id) = excluding {
        query = query.filter(partners::Column::Id.ne(id.0));
    }
    let rows = query.all(conn).await?;
    Ok(rows.iter().map(|p| p.profit_share_percentage).sum())
}

async fn insert_details<C: ConnectionTrait>(
    conn: &C,
    id: UserId,
    details: &RoleDetails,
) -> Result<RoleDetails, DbErr> {
    let stored = match details {
        RoleDetails::Patient(p) => RoleDetails::Patient(patient_details(
            patients::ActiveModel {
                id: Set(id.0),
                date_of_birth: Set(p.date_of_birth),
                address: Set(p.address.clone()),
                emergency_contact: Set(p.emergency_contact.clone()),
                medical_history: Set(p.medical_history.clone()),
            }
            .insert(conn)
            .await?,
        )),
        RoleDetails::Doctor(d) => RoleDetails::Doctor(doctor_details(
            doctors::ActiveModel {
                id: Set(id.0),
                specialization: Set(d.specialization.clone()),
                license_number: Set(d.license_number.clone()),
                consultation_fee: Set(d.consultation_fee),
                is_available: Set(d.is_available),
            }
            .insert(conn)
            .await?,
        )),
        RoleDetails::Staff(s) => RoleDetails::Staff(staff_details(
            staff::ActiveModel {
                id: Set(id.0),
                employee_id: Set(s.employee_id.clone()),
                department: Set(s.department.clone()),
                salary: Set(s.salary),
                hire_date: Set(s.hire_date),
            }
            .insert(conn)
            .await?,
        )),
        RoleDetails::Partner(p) => RoleDetails::Partner(partner_details(
            partners::ActiveModel {
                id: Set(id.0),
                profit_share_percentage: Set(p.profit_share_percentage),
                investment_amount: Set(p.investment_amount),
                join_date: Set(p.join_date),
            }
            .insert(conn)
            .await?,
        )),
        RoleDetails::Admin => RoleDetails::Admin,
    };
    Ok(stored)
}

/// Write the role fields present in `changes` that belong to `role`.
async fn update_details(
    txn: &sea_orm::DatabaseTransaction,
    id: UserId,
    role: UserRole,
    changes: &UserChanges,
) -> Result<(), WriteError> {
    match role {
        UserRole::Doctor
            if changes.specialization.is_some() || changes.consultation_fee.is_some() =>
        {
            let mut am = doctors::ActiveModel {
                id: Set(id.0),
                ..Default::default()
            };
            if let Some(ref specialization) = changes.specialization {
                am.specialization = Set(specialization.clone());
            }
            if let Some(fee) = changes.consultation_fee {
                am.consultation_fee = Set(fee);
            }
            am.update(txn).await?;
        }
        UserRole::Pharmacist if changes.department.is_some() || changes.salary.is_some() => {
            let mut am = staff::ActiveModel {
                id: Set(id.0),
                ..Default::default()
            };
            if let Some(ref department) = changes.department {
                am.department = Set(department.clone());
            }
            if let Some(salary) = changes.salary {
                am.salary = Set(salary);
            }
            am.update(txn).await?;
        }
        UserRole::Partner
            if changes.profit_share_percentage.is_some()
                || changes.investment_amount.is_some() =>
        {
            let mut am = partners::ActiveModel {
                id: Set(id.0),
                ..Default::default()
            };
            if let Some(share) = changes.profit_share_percentage {
                let current = sum_profit_share(txn, Some(id)).await?;
                ensure_profit_share_fits(current, share).map_err(WriteError::Rejected)?;
                am.profit_share_percentage = Set(share);
            }
            if let Some(amount) = changes.investment_amount {
                am.investment_amount = Set(amount);
            }
            am.update(txn).await?;
        }
        _ => {}
    }
    Ok(())
}

/// Join `account` with its satellite row. The inner error reports a user
/// whose satellite row is missing.
async fn load_record<C: ConnectionTrait>(
    conn: &C,
    account: Account,
) -> Result<Result<UserRecord, PharmacyServiceError>, DbErr> {
    let id = account.id.0;
    let details = match account.role {
        UserRole::Patient => patients::Entity::find_by_id(id)
            .one(conn)
            .await?
            .map(|m| RoleDetails::Patient(patient_details(m))),
        UserRole::Doctor => doctors::Entity::find_by_id(id)
            .one(conn)
            .await?
            .map(|m| RoleDetails::Doctor(doctor_details(m))),
        UserRole::Pharmacist => staff::Entity::find_by_id(id)
            .one(conn)
            .await?
            .map(|m| RoleDetails::Staff(staff_details(m))),
        UserRole::Partner => partners::Entity::find_by_id(id)
            .one(conn)
            .await?
            .map(|m| RoleDetails::Partner(partner_details(m))),
        UserRole::Admin => Some(RoleDetails::Admin),
    };
    Ok(match details {
        Some(details) => Ok(UserRecord { account, details }),
        None => Err(PharmacyServiceError::Internal(anyhow::anyhow!(
            "user {} has no {} row",
            account.id,
            account.role
        ))),
    })
}

fn join_rows<S>(
    rows: Vec<(users::Model, Option<S>)>,
    details: impl Fn(S) -> RoleDetails,
) -> Result<Vec<UserRecord>, PharmacyServiceError> {
    let mut records = Vec::with_capacity(rows.len());
    for (user, satellite) in rows {
        let account = account_from_model(user)?;
        match satellite {
            Some(satellite) => records.push(UserRecord {
                account,
                details: details(satellite),
            }),
            None => {
                tracing::warn!(user_id = %account.id, role = %account.role, "user has no satellite row, skipped");
            }
        }
    }
    Ok(records)
}

fn account_from_model(model: users::Model) -> Result<Account, PharmacyServiceError> {
    let role = model
        .role
        .parse::<UserRole>()
        .with_context(|| format!("stored role of user {}", model.id))?;
    Ok(Account {
        id: UserId(model.id),
        email: model.email,
        first_name: model.first_name,
        last_name: model.last_name,
        phone: model.phone,
        role,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

fn patient_details(model: patients::Model) -> PatientDetails {
    PatientDetails {
        date_of_birth: model.date_of_birth,
        address: model.address,
        emergency_contact: model.emergency_contact,
        medical_history: model.medical_history,
    }
}

fn doctor_details(model: doctors::Model) -> DoctorDetails {
    DoctorDetails {
        specialization: model.specialization,
        license_number: model.license_number,
        consultation_fee: model.consultation_fee,
        is_available: model.is_available,
    }
}

fn staff_details(model: staff::Model) -> StaffDetails {
    StaffDetails {
        employee_id: model.employee_id,
        department: model.department,
        salary: model.salary,
        hire_date: model.hire_date,
    }
}

fn partner_details(model: partners::Model) -> PartnerDetails {
    PartnerDetails {
        profit_share_percentage: model.profit_share_percentage,
        investment_amount: model.investment_amount,
        join_date: model.join_date,
    }
}

// ── Pharmacy config repository ───────────────────────────────────────────────

#[derive(Clone)]
pub struct DbPharmacyConfigRepository {
    pub db: DatabaseConnection,
}

impl PharmacyConfigRepository for DbPharmacyConfigRepository {
    async fn get(&self) -> Result<Option<PharmacyConfigRecord>, PharmacyServiceError> {
        let model = pharmacy_config::Entity::find_by_id(pharmacy_config::SINGLETON_ID)
            .one(&self.db)
            .await
            .context("find pharmacy config")?;
        model.map(config_from_model).transpose()
    }

    async fn upsert(
        &self,
        settings: &PharmacySettings,
    ) -> Result<PharmacyConfigRecord, PharmacyServiceError> {
        let working_hours =
            serde_json::to_string(&settings.working_hours).context("encode working hours")?;
        let now = Utc::now();
        let am = pharmacy_config::ActiveModel {
            id: Set(pharmacy_config::SINGLETON_ID),
            pharmacy_name: Set(settings.pharmacy_name.clone()),
            address: Set(settings.address.clone()),
            phone: Set(settings.phone.clone()),
            email: Set(settings.email.clone()),
            license_number: Set(settings.license_number.clone()),
            registration_number: Set(settings.registration_number.clone()),
            owner_name: Set(settings.owner_name.clone()),
            working_hours: Set(working_hours),
            currency: Set(settings.currency.clone()),
            tax_rate: Set(settings.tax_rate),
            created_at: Set(now),
            updated_at: Set(now),
        };
        pharmacy_config::Entity::insert(am)
            .on_conflict(
                OnConflict::column(pharmacy_config::Column::Id)
                    .update_columns([
                        pharmacy_config::Column::PharmacyName,
                        pharmacy_config::Column::Address,
                        pharmacy_config::Column::Phone,
                        pharmacy_config::Column::Email,
                        pharmacy_config::Column::LicenseNumber,
                        pharmacy_config::Column::RegistrationNumber,
                        pharmacy_config::Column::OwnerName,
                        pharmacy_config::Column::WorkingHours,
                        pharmacy_config::Column::Currency,
                        pharmacy_config::Column::TaxRate,
                        pharmacy_config::Column::UpdatedAt,
                    ])
                    .to_owned(),
            )
            .exec_without_returning(&self.db)
            .await
            .context("upsert pharmacy config")?;

        self.get()
            .await?
            .ok_or_else(|| anyhow::anyhow!("pharmacy config missing after upsert").into())
    }
}

fn config_from_model(
    model: pharmacy_config::Model,
) -> Result<PharmacyConfigRecord, PharmacyServiceError> {
    let working_hours =
        serde_json::from_str(&model.working_hours).context("decode stored working hours")?;
    Ok(PharmacyConfigRecord {
        id: model.id,
        settings: PharmacySettings {
            pharmacy_name: model.pharmacy_name,
            address: model.address,
            phone: model.phone,
            email: model.email,
            license_number: model.license_number,
            registration_number: model.registration_number,
            owner_name: model.owner_name,
            working_hours,
            currency: model.currency,
            tax_rate: model.tax_rate,
        },
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}
