/// Raw text of the entry form, as typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryForm {
    pub partner_name: String,
    pub vehicle_number: String,
    pub driver_name: String,
    pub amount: String,
    pub incentive: String,
}

impl EntryForm {
    /// Reset the trip fields. The partner name survives unless
    /// `remove_partner` is set, so several trips can be keyed in a row.
    pub fn clear(&mut self, remove_partner: bool) {
        if remove_partner {
            self.partner_name.clear();
        }
        self.vehicle_number.clear();
        self.driver_name.clear();
        self.amount.clear();
        self.incentive.clear();
    }
}
