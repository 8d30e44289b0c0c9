//! Plant type repository: reference data with fuzzy name lookup.

use chrono::Utc;

use phyto_core::entities::PlantType;
use phyto_core::ids::PREFIX_PLANT_TYPE;

use crate::error::DatabaseError;
use crate::helpers::{escape_like, format_datetime, get_bool, parse_datetime};
use crate::service::PhytoService;

const PLANT_TYPE_COLUMNS: &str = "id, name, active, created_at";

fn row_to_plant_type(row: &libsql::Row) -> Result<PlantType, DatabaseError> {
    Ok(PlantType {
        id: row.get::<String>(0)?,
        name: row.get::<String>(1)?,
        active: get_bool(row, 2)?,
        created_at: parse_datetime(&row.get::<String>(3)?)?,
    })
}

impl PhytoService {
    pub async fn create_plant_type(&self, name: &str) -> Result<PlantType, DatabaseError> {
        let now = Utc::now();
        let id = self.db().generate_id(PREFIX_PLANT_TYPE).await?;
        let name = name.trim();

        self.db()
            .conn()
            .execute(
                "INSERT INTO plant_types (id, name, active, created_at) VALUES (?1, ?2, 1, ?3)",
                libsql::params![id.as_str(), name, format_datetime(now)],
            )
            .await?;

        Ok(PlantType {
            id,
            name: name.to_string(),
            active: true,
            created_at: now,
        })
    }

    pub async fn get_plant_type(&self, id: &str) -> Result<PlantType, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!("SELECT {PLANT_TYPE_COLUMNS} FROM plant_types WHERE id = ?1"),
                [id],
            )
            .await?;
        let row = rows.next().await?.ok_or(DatabaseError::NoResult)?;
        row_to_plant_type(&row)
    }

    pub async fn set_plant_type_active(&self, id: &str, active: bool) -> Result<(), DatabaseError> {
        let changed = self
            .db()
            .conn()
            .execute(
                "UPDATE plant_types SET active = ?1 WHERE id = ?2",
                libsql::params![i64::from(active), id],
            )
            .await?;
        if changed == 0 {
            return Err(DatabaseError::NoResult);
        }
        Ok(())
    }

    pub async fn get_all_active_plant_types(&self) -> Result<Vec<PlantType>, DatabaseError> {
        let mut rows = self
            .db()
            .conn()
            .query(
                &format!(
                    "SELECT {PLANT_TYPE_COLUMNS} FROM plant_types WHERE active = 1 ORDER BY name COLLATE NOCASE"
                ),
                (),
            )
            .await?;

        let mut plant_types = Vec::new();
        while let Some(row) = rows.next().await? {
            plant_types.push(row_to_plant_type(&row)?);
        }
        Ok(plant_types)
    }

    /// Fuzzy lookup of an active plant type by name.
    ///
    /// Tries, in order: exact case-insensitive match, shortest stored name
    /// containing `name`, longest stored name contained in `name`
    /// (so `"cherry tomato plant"` resolves to `"Tomato"`).
    pub async fn find_plant_type_by_name(
        &self,
        name: &str,
    ) -> Result<Option<PlantType>, DatabaseError> {
        let name = name.trim();
        if name.is_empty() {
            return Ok(None);
        }

        let pattern = escape_like(name);
        let queries = [
            (
                format!(
                    "SELECT {PLANT_TYPE_COLUMNS} FROM plant_types
                     WHERE active = 1 AND name = ?1 COLLATE NOCASE LIMIT 1"
                ),
                name,
            ),
            (
                format!(
                    "SELECT {PLANT_TYPE_COLUMNS} FROM plant_types
                     WHERE active = 1 AND name LIKE '%' || ?1 || '%' ESCAPE '\\'
                     ORDER BY length(name), name LIMIT 1"
                ),
                pattern.as_str(),
            ),
            (
                format!(
                    "SELECT {PLANT_TYPE_COLUMNS} FROM plant_types
                     WHERE active = 1 AND instr(lower(?1), lower(name)) > 0
                     ORDER BY length(name) DESC, name LIMIT 1"
                ),
                name,
            ),
        ];

        for (sql, param) in &queries {
            let mut rows = self.db().conn().query(sql, [*param]).await?;
            if let Some(row) = rows.next().await? {
                return Ok(Some(row_to_plant_type(&row)?));
            }
        }
        Ok(None)
    }

    /// Resolve a plant-type hint that may be either an ID or a name.
    ///
    /// Exact ID wins; otherwise falls back to [`Self::find_plant_type_by_name`].
    pub async fn resolve_plant_type(&self, hint: &str) -> Result<Option<PlantType>, DatabaseError> {
        match self.get_plant_type(hint.trim()).await {
            Ok(plant_type) if plant_type.active => Ok(Some(plant_type)),
            Ok(_) | Err(DatabaseError::NoResult) => self.find_plant_type_by_name(hint).await,
            Err(e) => Err(e),
        }
    }
}
