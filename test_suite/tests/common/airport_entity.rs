use chrono::NaiveDateTime;
use sea_orm::{QueryOrder, entity::prelude::*};
use searchcrate::{
    BooleanFilter, DateFilter, FilterBinding, FilterSet, IdListFilter, IdRangeFilter,
    NumberFilter, Searchable, SortRegistry, TextFilter, async_trait,
};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "airports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
    pub elevation: Option<f64>,
    pub international: bool,
    pub opened_on: Option<NaiveDateTime>,
    pub city_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// API representation of an airport
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AirportResponse {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
    pub elevation: Option<f64>,
}

impl From<Model> for AirportResponse {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            code: model.code,
            elevation: model.elevation,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AirportFilters {
    pub ids: Option<IdListFilter>,
    pub id_range: Option<IdRangeFilter>,
    pub name: Option<TextFilter>,
    pub code: Option<TextFilter>,
    pub elevation: Option<NumberFilter>,
    pub international: Option<BooleanFilter>,
    pub opened_on: Option<DateFilter>,
    pub city_ids: Option<IdListFilter>,
}

impl FilterSet for AirportFilters {
    type Column = Column;

    fn bindings(&self) -> Vec<FilterBinding<Column>> {
        [
            FilterBinding::optional("ids", Column::Id, self.ids.as_ref()),
            FilterBinding::optional("id_range", Column::Id, self.id_range.as_ref()),
            FilterBinding::optional("name", Column::Name, self.name.as_ref()),
            FilterBinding::optional("code", Column::Code, self.code.as_ref()),
            FilterBinding::optional("elevation", Column::Elevation, self.elevation.as_ref()),
            FilterBinding::optional(
                "international",
                Column::International,
                self.international.as_ref(),
            ),
            FilterBinding::optional("opened_on", Column::OpenedOn, self.opened_on.as_ref()),
            FilterBinding::optional("city_ids", Column::CityId, self.city_ids.as_ref()),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn multi_value_fields() -> &'static [&'static str] {
        &["code"]
    }
}

pub static SORTS: LazyLock<SortRegistry<Entity>> = LazyLock::new(|| {
    SortRegistry::new("Airport")
        .add("id", Column::Id)
        .add("name", Column::Name)
        .add("code", Column::Code)
        .add("elevation", Column::Elevation)
        .add("openedOn", Column::OpenedOn)
});

pub struct AirportSearch;

#[async_trait]
impl Searchable for AirportSearch {
    type Entity = Entity;
    type Filters = AirportFilters;
    type Output = AirportResponse;

    const RESOURCE_NAME: &'static str = "airports";

    fn sort_registry() -> &'static SortRegistry<Entity> {
        &SORTS
    }

    fn default_ordering(query: Select<Entity>) -> Select<Entity> {
        query.order_by_asc(Column::Name)
    }
}
